use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::{error, info};
use uuid::Uuid;

use crate::db::account_queries;
use crate::errors::AppError;
use crate::models::{Account, CreateAccount};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/:user_id/accounts", post(create_account))
        .route("/users/:user_id/accounts", get(list_accounts))
        .route("/accounts/:id", get(get_account))
}

async fn create_account(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(data): Json<CreateAccount>,
) -> Result<Json<Account>, AppError> {
    info!("POST /users/{}/accounts - Creating account", user_id);

    if data.name.trim().is_empty() {
        return Err(AppError::Validation("account name is required".to_string()));
    }

    let account = account_queries::create(&state.pool, user_id, data)
        .await
        .map_err(|e| {
            error!("Failed to create account: {}", e);
            AppError::Db(e)
        })?;

    Ok(Json(account))
}

async fn list_accounts(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<Account>>, AppError> {
    info!("GET /users/{}/accounts - Listing accounts", user_id);

    let accounts = account_queries::fetch_for_user(&state.pool, user_id)
        .await
        .map_err(|e| {
            error!("Failed to fetch accounts: {}", e);
            AppError::Db(e)
        })?;

    Ok(Json(accounts))
}

async fn get_account(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Account>, AppError> {
    let account = account_queries::fetch_one(&state.pool, id)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(account))
}
