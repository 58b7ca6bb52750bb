use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Budget;

pub async fn fetch_all(pool: &PgPool) -> Result<Vec<Budget>, sqlx::Error> {
    sqlx::query_as::<_, Budget>(
        "SELECT id, user_id, amount, last_alert_sent, created_at, updated_at
         FROM budgets
         ORDER BY created_at ASC",
    )
    .fetch_all(pool)
    .await
}

pub async fn fetch_for_user(pool: &PgPool, user_id: Uuid) -> Result<Option<Budget>, sqlx::Error> {
    sqlx::query_as::<_, Budget>(
        "SELECT id, user_id, amount, last_alert_sent, created_at, updated_at
         FROM budgets
         WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// One budget per user: creating again replaces the cap amount.
pub async fn upsert(
    pool: &PgPool,
    user_id: Uuid,
    amount: BigDecimal,
) -> Result<Budget, sqlx::Error> {
    sqlx::query_as::<_, Budget>(
        "INSERT INTO budgets (user_id, amount)
         VALUES ($1, $2)
         ON CONFLICT (user_id)
         DO UPDATE SET amount = EXCLUDED.amount, updated_at = NOW()
         RETURNING id, user_id, amount, last_alert_sent, created_at, updated_at",
    )
    .bind(user_id)
    .bind(amount)
    .fetch_one(pool)
    .await
}

pub async fn mark_alert_sent(
    pool: &PgPool,
    id: Uuid,
    at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE budgets SET last_alert_sent = $1, updated_at = NOW() WHERE id = $2")
        .bind(at)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
