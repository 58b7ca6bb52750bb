use axum::extract::{Path, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use bigdecimal::BigDecimal;
use chrono::Utc;
use tracing::{error, info};
use uuid::Uuid;

use crate::db::transaction_queries;
use crate::errors::AppError;
use crate::models::{CreateTransaction, Transaction};
use crate::services::recurrence;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/:user_id/transactions", post(create_transaction))
        .route("/accounts/:account_id/transactions", get(list_transactions))
        .route("/transactions/:id", get(get_transaction))
        .route("/transactions/:id", delete(delete_transaction))
}

async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Transaction>, AppError> {
    let transaction = transaction_queries::fetch_one(&state.pool, id)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(transaction))
}

async fn create_transaction(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(data): Json<CreateTransaction>,
) -> Result<Json<Transaction>, AppError> {
    info!("POST /users/{}/transactions - Creating transaction", user_id);

    if data.amount < BigDecimal::from(0) {
        return Err(AppError::Validation(
            "amount must not be negative".to_string(),
        ));
    }
    if data.is_recurring && data.recurring_interval.is_none() {
        return Err(AppError::Validation(
            "recurring transactions need an interval".to_string(),
        ));
    }

    // A fresh recurring template gets its first due date up front so the
    // trigger job has something to compare against.
    let next_recurring_date = match (data.is_recurring, data.recurring_interval) {
        (true, Some(interval)) => Some(recurrence::next_occurrence(Utc::now(), interval)),
        _ => None,
    };

    let transaction =
        transaction_queries::create_with_balance(&state.pool, user_id, data, next_recurring_date)
            .await
            .map_err(|e| {
                error!("Failed to create transaction: {}", e);
                AppError::Db(e)
            })?;

    Ok(Json(transaction))
}

async fn list_transactions(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> Result<Json<Vec<Transaction>>, AppError> {
    info!("GET /accounts/{}/transactions - Listing transactions", account_id);

    let transactions = transaction_queries::fetch_for_account(&state.pool, account_id)
        .await
        .map_err(|e| {
            error!("Failed to fetch transactions: {}", e);
            AppError::Db(e)
        })?;

    Ok(Json(transactions))
}

async fn delete_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Transaction>, AppError> {
    info!("DELETE /transactions/{} - Deleting transaction", id);

    let deleted = transaction_queries::delete_with_balance(&state.pool, id)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(deleted))
}
