use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use tracing::{error, info};

use crate::db::user_queries;
use crate::errors::AppError;
use crate::models::{CreateUser, User};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/users", post(create_user))
}

async fn create_user(
    State(state): State<AppState>,
    Json(data): Json<CreateUser>,
) -> Result<Json<User>, AppError> {
    info!("POST /users - Creating user");

    if data.email.trim().is_empty() || !data.email.contains('@') {
        return Err(AppError::Validation("a valid email is required".to_string()));
    }

    let user = user_queries::create(&state.pool, data).await.map_err(|e| {
        error!("Failed to create user: {}", e);
        AppError::Db(e)
    })?;

    Ok(Json(user))
}
