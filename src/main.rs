mod app;
mod db;
mod errors;
mod jobs;
mod logging;
mod models;
mod routes;
mod services;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;

use crate::logging::LoggingConfig;
use crate::services::email_service::{EmailConfig, EmailService};
use crate::services::insights_service::InsightsService;
use crate::services::job_dispatcher::{self, JobDispatcher, UserThrottle};
use crate::services::job_scheduler_service::{JobContext, JobSchedulerService};
use crate::state::AppState;

// At most this many recurring-transaction applications per user per minute.
const EVENTS_PER_USER_PER_MINUTE: usize = 10;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    logging::init_logging(LoggingConfig::from_env())
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    let database_url = std::env::var("DATABASE_URL")?;
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await?;

    sqlx::migrate!().run(&pool).await?;

    let insights = Arc::new(InsightsService::from_env());
    tracing::info!("Insight generation enabled: {}", insights.is_enabled());
    let mailer = Arc::new(EmailService::new(EmailConfig::from_env()));

    let (dispatcher, event_rx) = JobDispatcher::new();
    let throttle = Arc::new(UserThrottle::new(
        EVENTS_PER_USER_PER_MINUTE,
        Duration::from_secs(60),
    ));
    job_dispatcher::spawn_worker(event_rx, Arc::new(pool.clone()), throttle);

    let job_context = JobContext {
        pool: Arc::new(pool.clone()),
        insights: insights.clone(),
        mailer: mailer.clone(),
        dispatcher: dispatcher.clone(),
    };
    let mut scheduler = JobSchedulerService::new(job_context)
        .await
        .map_err(|e| anyhow::anyhow!("failed to create scheduler: {e}"))?;
    scheduler
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("failed to start scheduler: {e}"))?;

    let state = AppState {
        pool,
        dispatcher,
        insights,
        mailer,
    };
    let app = app::create_app(state);

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("🚀 Ledgerly backend running at http://{}/", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
