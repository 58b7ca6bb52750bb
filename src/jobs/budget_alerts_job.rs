use tracing::{error, info};

use crate::db::budget_queries;
use crate::errors::AppError;
use crate::services::budget_alert_service;
use crate::services::job_scheduler_service::{JobContext, JobResult};

/// Check every budget against the current month's spending on the owner's
/// default account. Each budget is independent: a failed check or send is
/// counted and logged, and the loop moves on.
pub async fn check_budget_alerts(ctx: JobContext) -> Result<JobResult, AppError> {
    info!("Starting budget alert check");

    let pool = ctx.pool.as_ref();
    let budgets = budget_queries::fetch_all(pool).await?;

    if budgets.is_empty() {
        info!("No budgets to check");
        return Ok(JobResult {
            items_processed: 0,
            items_failed: 0,
        });
    }

    let mut processed = 0;
    let mut failed = 0;
    let mut alerts_sent = 0;

    for budget in &budgets {
        match budget_alert_service::check_budget(pool, ctx.mailer.as_ref(), budget).await {
            Ok(fired) => {
                processed += 1;
                if fired {
                    alerts_sent += 1;
                }
            }
            Err(e) => {
                failed += 1;
                error!("Failed to check budget {}: {}", budget.id, e);
            }
        }
    }

    info!(
        "Budget alert check completed: {} budgets checked, {} failed, {} alerts sent",
        processed, failed, alerts_sent
    );

    Ok(JobResult {
        items_processed: processed,
        items_failed: failed,
    })
}
