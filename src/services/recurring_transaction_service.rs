use chrono::Utc;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::{account_queries, transaction_queries};
use crate::errors::AppError;
use crate::services::recurrence;

/// What happened to a single recurring template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// A realized transaction was written and the balance adjusted.
    Applied,
    /// The template was no longer due (or gone) at apply time; nothing
    /// was written. Not an error.
    Skipped,
}

/// Apply one due recurring template: insert the realized instance, adjust
/// the account balance, and advance the recurrence pointer — all in one
/// database transaction.
///
/// The claim re-checks the due predicate, so a template picked up twice
/// (duplicate event delivery, concurrent runs) is applied exactly once;
/// the second claim matches nothing and the unit becomes a no-op.
pub async fn process_recurring_transaction(
    pool: &PgPool,
    transaction_id: Uuid,
    user_id: Uuid,
) -> Result<ApplyOutcome, AppError> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;

    let Some(template) =
        transaction_queries::claim_due(&mut tx, transaction_id, user_id, now).await?
    else {
        debug!(
            "Recurring transaction {} not due at apply time, skipping",
            transaction_id
        );
        tx.rollback().await?;
        return Ok(ApplyOutcome::Skipped);
    };

    let interval = template.recurring_interval.ok_or_else(|| {
        AppError::Validation(format!(
            "recurring transaction {} has no interval",
            template.id
        ))
    })?;

    let realized = transaction_queries::insert_realized(&mut tx, &template, now).await?;
    account_queries::adjust_balance(&mut tx, template.account_id, &realized.signed_amount())
        .await?;

    let next = recurrence::next_occurrence(now, interval);
    transaction_queries::set_next_recurring(&mut tx, template.id, next).await?;

    tx.commit().await?;

    info!(
        "Applied recurring transaction {} for user {} (next due {})",
        template.id, user_id, next
    );
    Ok(ApplyOutcome::Applied)
}
