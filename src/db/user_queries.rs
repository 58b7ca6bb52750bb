use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{CreateUser, User};

pub async fn create(pool: &PgPool, input: CreateUser) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "INSERT INTO users (email, name)
         VALUES ($1, $2)
         RETURNING id, email, name, created_at",
    )
    .bind(input.email)
    .bind(input.name)
    .fetch_one(pool)
    .await
}

pub async fn fetch_one(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT id, email, name, created_at FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Users that own at least one account. The monthly report has nothing to
/// say about anyone else.
pub async fn fetch_with_accounts(pool: &PgPool) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT u.id, u.email, u.name, u.created_at
         FROM users u
         WHERE EXISTS (SELECT 1 FROM accounts a WHERE a.user_id = u.id)
         ORDER BY u.created_at ASC",
    )
    .fetch_all(pool)
    .await
}
