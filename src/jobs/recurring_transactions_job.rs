use chrono::Utc;
use tracing::{info, warn};

use crate::db::transaction_queries;
use crate::errors::AppError;
use crate::services::job_dispatcher::RecurringTransactionEvent;
use crate::services::job_scheduler_service::{JobContext, JobResult};

/// Find every due recurring transaction and emit one processing event per
/// template. The worker applies them; this job only fans out, so a re-run
/// that re-emits an event is harmless (the applier's claim is conditional).
pub async fn trigger_recurring_transactions(ctx: JobContext) -> Result<JobResult, AppError> {
    info!("Scanning for due recurring transactions");

    let due = transaction_queries::fetch_due_recurring(ctx.pool.as_ref(), Utc::now()).await?;

    if due.is_empty() {
        info!("No recurring transactions due");
        return Ok(JobResult {
            items_processed: 0,
            items_failed: 0,
        });
    }

    let mut dispatched = 0;
    let mut failed = 0;

    for transaction in &due {
        let event = RecurringTransactionEvent {
            transaction_id: transaction.id,
            user_id: transaction.user_id,
        };
        match ctx.dispatcher.dispatch(event) {
            Ok(()) => dispatched += 1,
            Err(e) => {
                failed += 1;
                warn!(
                    "Failed to dispatch event for transaction {}: {}",
                    transaction.id, e
                );
            }
        }
    }

    info!(
        "Recurring transaction trigger completed: {} events dispatched, {} failed",
        dispatched, failed
    );

    Ok(JobResult {
        items_processed: dispatched,
        items_failed: failed,
    })
}
