use tracing::{error, info};

use crate::db::user_queries;
use crate::errors::AppError;
use crate::services::job_scheduler_service::{JobContext, JobResult};
use crate::services::monthly_report_service;

/// Build and email last month's report for every user with at least one
/// account. Users are independent: one failed report is logged and counted,
/// and the loop continues.
pub async fn generate_monthly_reports(ctx: JobContext) -> Result<JobResult, AppError> {
    info!("Starting monthly report generation");

    let pool = ctx.pool.as_ref();
    let users = user_queries::fetch_with_accounts(pool).await?;

    if users.is_empty() {
        info!("No users with accounts to report on");
        return Ok(JobResult {
            items_processed: 0,
            items_failed: 0,
        });
    }

    let mut processed = 0;
    let mut failed = 0;

    for user in &users {
        match monthly_report_service::generate_report_for_user(
            pool,
            ctx.insights.as_ref(),
            ctx.mailer.as_ref(),
            user,
        )
        .await
        {
            Ok(()) => processed += 1,
            Err(e) => {
                failed += 1;
                error!("Failed to generate report for user {}: {}", user.id, e);
            }
        }
    }

    info!(
        "Monthly report generation completed: {} reports sent, {} failed",
        processed, failed
    );

    Ok(JobResult {
        items_processed: processed,
        items_failed: failed,
    })
}
