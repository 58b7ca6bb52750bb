use bigdecimal::ToPrimitive;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, info};

use crate::db::{account_queries, budget_queries, transaction_queries, user_queries};
use crate::errors::AppError;
use crate::models::Budget;
use crate::services::email_service::EmailService;
use crate::services::recurrence;

/// Alert once spending reaches this share of the budget.
const ALERT_THRESHOLD_PCT: f64 = 80.0;

/// Check one budget against the owner's default account and alert when
/// warranted. Returns true when an alert email went out.
///
/// The `last_alert_sent` stamp is written only after a successful send, so
/// a failed send leaves the budget eligible for the next run. The
/// month-comparison guard keeps re-runs within the same calendar month
/// from alerting twice.
pub async fn check_budget(
    pool: &PgPool,
    mailer: &EmailService,
    budget: &Budget,
) -> Result<bool, AppError> {
    let Some(account) = account_queries::fetch_default_for_user(pool, budget.user_id).await? else {
        // A user without a default account has nothing to alert against.
        debug!("User {} has no default account, skipping budget", budget.user_id);
        return Ok(false);
    };

    let now = Utc::now();
    let (month_start, month_end) = recurrence::month_window(now);
    let total_expenses = transaction_queries::sum_expenses_for_account(
        pool,
        budget.user_id,
        account.id,
        month_start,
        month_end,
    )
    .await?;

    let percentage_used = percentage_used(
        total_expenses.to_f64().unwrap_or(0.0),
        budget.amount.to_f64().unwrap_or(0.0),
    );

    if !should_alert(percentage_used, budget.last_alert_sent, now) {
        return Ok(false);
    }

    let user = user_queries::fetch_one(pool, budget.user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    mailer
        .send_budget_alert(
            &user,
            &account.name,
            percentage_used,
            &budget.amount.with_scale(2).to_string(),
            &total_expenses.with_scale(2).to_string(),
        )
        .await?;

    budget_queries::mark_alert_sent(pool, budget.id, now).await?;

    info!(
        "Budget alert sent to {} ({:.1}% of budget used)",
        user.email, percentage_used
    );
    Ok(true)
}

fn percentage_used(total_expenses: f64, budget_amount: f64) -> f64 {
    (total_expenses / budget_amount) * 100.0
}

/// The alert gate: threshold reached and no alert yet this calendar month.
fn should_alert(
    percentage_used: f64,
    last_alert_sent: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    percentage_used >= ALERT_THRESHOLD_PCT
        && last_alert_sent.map_or(true, |last| recurrence::is_new_month(last, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn alerts_at_85_percent_with_no_prior_alert() {
        let now = Utc.with_ymd_and_hms(2025, 5, 20, 8, 0, 0).unwrap();
        assert!(should_alert(percentage_used(850.0, 1000.0), None, now));
    }

    #[test]
    fn does_not_alert_below_threshold() {
        let now = Utc.with_ymd_and_hms(2025, 5, 20, 8, 0, 0).unwrap();
        assert!(!should_alert(percentage_used(700.0, 1000.0), None, now));
    }

    #[test]
    fn alerts_exactly_at_threshold() {
        let now = Utc.with_ymd_and_hms(2025, 5, 20, 8, 0, 0).unwrap();
        assert!(should_alert(percentage_used(800.0, 1000.0), None, now));
    }

    #[test]
    fn does_not_alert_twice_in_the_same_month() {
        let earlier = Utc.with_ymd_and_hms(2025, 5, 2, 6, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 5, 20, 8, 0, 0).unwrap();
        assert!(!should_alert(85.0, Some(earlier), now));
    }

    #[test]
    fn alerts_again_in_a_new_month() {
        let last_month = Utc.with_ymd_and_hms(2025, 4, 28, 6, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 5, 1, 8, 0, 0).unwrap();
        assert!(should_alert(85.0, Some(last_month), now));
    }

    #[test]
    fn zero_budget_with_spending_alerts() {
        let now = Utc.with_ymd_and_hms(2025, 5, 20, 8, 0, 0).unwrap();
        // Division yields infinity, which clears the threshold.
        assert!(should_alert(percentage_used(100.0, 0.0), None, now));
    }
}
