use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::db::job_run_queries;
use crate::errors::AppError;
use crate::jobs::{budget_alerts_job, monthly_report_job, recurring_transactions_job};
use crate::services::email_service::EmailService;
use crate::services::insights_service::InsightsService;
use crate::services::job_dispatcher::JobDispatcher;

// Context passed to job functions
#[derive(Clone)]
pub struct JobContext {
    pub pool: Arc<PgPool>,
    pub insights: Arc<InsightsService>,
    pub mailer: Arc<EmailService>,
    pub dispatcher: JobDispatcher,
}

pub struct JobSchedulerService {
    scheduler: JobScheduler,
    context: JobContext,
}

impl JobSchedulerService {
    pub async fn new(context: JobContext) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::External(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self { scheduler, context })
    }

    /// Start all scheduled jobs
    pub async fn start(&mut self) -> Result<(), AppError> {
        info!("🚀 Starting job scheduler...");

        // Test mode shrinks every schedule to minutes for local smoke runs
        let test_mode = std::env::var("JOB_SCHEDULER_TEST_MODE")
            .unwrap_or_else(|_| "false".to_string())
            .parse::<bool>()
            .unwrap_or(false);

        if test_mode {
            info!("⚠️  JOB SCHEDULER IN TEST MODE - Jobs will run every few minutes!");
        }

        // Format: sec min hour day month weekday
        let budget_schedule = if test_mode { "0 */2 * * * *" } else { "0 0 */6 * * *" };
        let budget_desc = if test_mode { "Every 2 minutes (TEST MODE)" } else { "Every 6 hours" };

        self.schedule_job(
            budget_schedule,
            "check_budget_alerts",
            budget_desc,
            budget_alerts_job::check_budget_alerts,
        )
        .await?;

        let recurring_schedule = if test_mode { "0 */1 * * * *" } else { "0 0 0 * * *" };
        let recurring_desc = if test_mode { "Every minute (TEST MODE)" } else { "Daily at midnight" };

        self.schedule_job(
            recurring_schedule,
            "trigger_recurring_transactions",
            recurring_desc,
            recurring_transactions_job::trigger_recurring_transactions,
        )
        .await?;

        let report_schedule = if test_mode { "0 */5 * * * *" } else { "0 0 0 1 * *" };
        let report_desc = if test_mode { "Every 5 minutes (TEST MODE)" } else { "First of the month at midnight" };

        self.schedule_job(
            report_schedule,
            "generate_monthly_reports",
            report_desc,
            monthly_report_job::generate_monthly_reports,
        )
        .await?;

        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::External(format!("Failed to start scheduler: {}", e)))?;

        info!("✅ Job scheduler started with 3 jobs");
        Ok(())
    }

    /// Stop the scheduler gracefully
    #[allow(dead_code)]
    pub async fn stop(&mut self) -> Result<(), AppError> {
        info!("🛑 Stopping job scheduler...");
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::External(format!("Failed to stop scheduler: {}", e)))?;
        info!("✅ Job scheduler stopped");
        Ok(())
    }

    /// Helper to schedule a job with tracking
    async fn schedule_job<F, Fut>(
        &mut self,
        schedule: &str,
        job_name: &'static str,
        description: &str,
        job_fn: F,
    ) -> Result<(), AppError>
    where
        F: Fn(JobContext) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<JobResult, AppError>> + Send + 'static,
    {
        let context = self.context.clone();
        let job_fn = Arc::new(job_fn);

        let job = Job::new_async(schedule, move |_uuid, _l| {
            let context = context.clone();
            let job_fn = job_fn.clone();
            Box::pin(async move {
                execute_job_with_tracking(job_name, context, job_fn).await;
            })
        })
        .map_err(|e| AppError::External(format!("Failed to create job {}: {}", job_name, e)))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::External(format!("Failed to add job {}: {}", job_name, e)))?;

        info!("📅 Scheduled: {} - {} [cron: {}]", job_name, description, schedule);
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct JobResult {
    pub items_processed: i32,
    pub items_failed: i32,
}

/// Run one job invocation and record its outcome in `job_runs`.
pub async fn execute_job_with_tracking<F, Fut>(
    job_name: &str,
    context: JobContext,
    job_fn: Arc<F>,
) where
    F: Fn(JobContext) -> Fut,
    Fut: std::future::Future<Output = Result<JobResult, AppError>>,
{
    info!("🏃 Starting job: {}", job_name);
    let started_at = Utc::now();
    let pool = context.pool.clone();

    let job_id = match job_run_queries::record_start(pool.as_ref(), job_name).await {
        Ok(id) => id,
        Err(e) => {
            error!("Failed to record job start: {}", e);
            return;
        }
    };

    let result = job_fn(context).await;

    let duration_ms = (Utc::now() - started_at).num_milliseconds();

    match result {
        Ok(job_result) => {
            info!(
                "✅ Job completed: {} (processed: {}, failed: {}, duration: {}ms)",
                job_name, job_result.items_processed, job_result.items_failed, duration_ms
            );

            if let Err(e) = job_run_queries::record_success(
                pool.as_ref(),
                job_id,
                job_result.items_processed,
                job_result.items_failed,
                duration_ms,
            )
            .await
            {
                error!("Failed to record job success: {}", e);
            }
        }
        Err(e) => {
            error!("❌ Job failed: {} - {}", job_name, e);

            if let Err(e) =
                job_run_queries::record_failure(pool.as_ref(), job_id, &e.to_string(), duration_ms)
                    .await
            {
                error!("Failed to record job failure: {}", e);
            }
        }
    }
}
