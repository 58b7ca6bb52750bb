use axum::extract::{Path, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use bigdecimal::BigDecimal;
use tracing::{error, info};
use uuid::Uuid;

use crate::db::budget_queries;
use crate::errors::AppError;
use crate::models::{Budget, UpsertBudget};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/:user_id/budget", get(get_budget))
        .route("/users/:user_id/budget", put(upsert_budget))
}

async fn get_budget(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Budget>, AppError> {
    let budget = budget_queries::fetch_for_user(&state.pool, user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(budget))
}

async fn upsert_budget(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(data): Json<UpsertBudget>,
) -> Result<Json<Budget>, AppError> {
    info!("PUT /users/{}/budget - Setting budget", user_id);

    if data.amount <= BigDecimal::from(0) {
        return Err(AppError::Validation(
            "budget amount must be positive".to_string(),
        ));
    }

    let budget = budget_queries::upsert(&state.pool, user_id, data.amount)
        .await
        .map_err(|e| {
            error!("Failed to upsert budget: {}", e);
            AppError::Db(e)
        })?;

    Ok(Json(budget))
}
