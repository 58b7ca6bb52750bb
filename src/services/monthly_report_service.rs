use chrono::Utc;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::db::transaction_queries;
use crate::errors::AppError;
use crate::models::{MonthlyStats, User};
use crate::services::email_service::EmailService;
use crate::services::insights_service::InsightsService;
use crate::services::recurrence;

/// Build and deliver one user's report for the prior calendar month.
///
/// The insight call is best-effort: any generation failure falls back to
/// the generic list so the report itself always goes out.
pub async fn generate_report_for_user(
    pool: &PgPool,
    insights: &InsightsService,
    mailer: &EmailService,
    user: &User,
) -> Result<(), AppError> {
    let now = Utc::now();
    let (start, end) = recurrence::prior_month_window(now);
    let month = recurrence::month_name(start);

    let transactions =
        transaction_queries::fetch_in_range_for_user(pool, user.id, start, end).await?;
    let stats = MonthlyStats::from_transactions(&transactions);

    let insight_list = match insights.monthly_insights(&stats, &month).await {
        Ok(list) => list,
        Err(e) => {
            warn!(
                "Insight generation failed for user {} ({}), using fallback",
                user.id, e
            );
            fallback_insights()
        }
    };

    mailer
        .send_monthly_report(user, &month, &stats, &insight_list)
        .await?;

    info!(
        "Monthly report for {} sent to {} ({} transactions)",
        month, user.email, stats.transaction_count
    );
    Ok(())
}

/// Generic insights used whenever the generation service is unavailable or
/// returns something unparsable.
pub fn fallback_insights() -> Vec<String> {
    vec![
        "Your highest expense category might need attention.".to_string(),
        "Consider reviewing your spending habits.".to_string(),
        "Look for opportunities to save more next month.".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_has_three_generic_insights() {
        let insights = fallback_insights();
        assert_eq!(insights.len(), 3);
        assert!(insights.iter().all(|i| !i.is_empty()));
    }
}
