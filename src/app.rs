use axum::Router;
use tower_http::cors::CorsLayer;

use crate::routes::{accounts, budgets, health, jobs, receipts, transactions, users};
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    let api = Router::new()
        .merge(users::router())
        .merge(accounts::router())
        .merge(transactions::router())
        .merge(budgets::router())
        .merge(receipts::router())
        .nest("/jobs", jobs::router());

    Router::<AppState>::new()
        .nest("/health", health::router())
        .nest("/api", api)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
