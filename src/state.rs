use std::sync::Arc;

use sqlx::PgPool;

use crate::services::email_service::EmailService;
use crate::services::insights_service::InsightsService;
use crate::services::job_dispatcher::JobDispatcher;
use crate::services::job_scheduler_service::JobContext;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub dispatcher: JobDispatcher,
    pub insights: Arc<InsightsService>,
    pub mailer: Arc<EmailService>,
}

impl AppState {
    /// Context for running a job from an HTTP trigger with the same
    /// collaborators the scheduler hands out.
    pub fn job_context(&self) -> JobContext {
        JobContext {
            pool: Arc::new(self.pool.clone()),
            insights: self.insights.clone(),
            mailer: self.mailer.clone(),
            dispatcher: self.dispatcher.clone(),
        }
    }
}
