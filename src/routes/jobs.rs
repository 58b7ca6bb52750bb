use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::job_run_queries::{self, JobRun};
use crate::errors::AppError;
use crate::jobs::{budget_alerts_job, monthly_report_job, recurring_transactions_job};
use crate::services::job_dispatcher::RecurringTransactionEvent;
use crate::services::job_scheduler_service::JobResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/recent", get(recent_job_runs))
        .route("/budget-alerts/run", post(run_budget_alerts))
        .route("/recurring/run", post(run_recurring_trigger))
        .route("/monthly-report/run", post(run_monthly_reports))
        .route("/recurring/process", post(enqueue_recurring_event))
}

/// GET /api/jobs/recent - Most recent job runs
async fn recent_job_runs(State(state): State<AppState>) -> Result<Json<Vec<JobRun>>, AppError> {
    let runs = job_run_queries::recent(&state.pool, 50).await?;
    Ok(Json(runs))
}

/// POST /api/jobs/budget-alerts/run - Run the budget check immediately
async fn run_budget_alerts(State(state): State<AppState>) -> Result<Json<JobResult>, AppError> {
    info!("POST /jobs/budget-alerts/run - Manual trigger");
    let result = budget_alerts_job::check_budget_alerts(state.job_context()).await?;
    Ok(Json(result))
}

/// POST /api/jobs/recurring/run - Scan for due recurring transactions now
async fn run_recurring_trigger(State(state): State<AppState>) -> Result<Json<JobResult>, AppError> {
    info!("POST /jobs/recurring/run - Manual trigger");
    let result =
        recurring_transactions_job::trigger_recurring_transactions(state.job_context()).await?;
    Ok(Json(result))
}

/// POST /api/jobs/monthly-report/run - Generate reports immediately
async fn run_monthly_reports(State(state): State<AppState>) -> Result<Json<JobResult>, AppError> {
    info!("POST /jobs/monthly-report/run - Manual trigger");
    let result = monthly_report_job::generate_monthly_reports(state.job_context()).await?;
    Ok(Json(result))
}

/// Wire shape of an externally delivered processing event. Both ids are
/// optional so a malformed payload surfaces as a validation error rather
/// than a deserialization failure.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecurringEventPayload {
    transaction_id: Option<Uuid>,
    user_id: Option<Uuid>,
}

/// POST /api/jobs/recurring/process - Enqueue one processing event
async fn enqueue_recurring_event(
    State(state): State<AppState>,
    Json(payload): Json<RecurringEventPayload>,
) -> Result<Json<Value>, AppError> {
    let (Some(transaction_id), Some(user_id)) = (payload.transaction_id, payload.user_id) else {
        warn!("Rejected recurring event with missing ids: {:?}", payload);
        return Err(AppError::Validation(
            "transactionId and userId are required".to_string(),
        ));
    };

    state.dispatcher.dispatch(RecurringTransactionEvent {
        transaction_id,
        user_id,
    })?;

    Ok(Json(json!({ "queued": true })))
}
