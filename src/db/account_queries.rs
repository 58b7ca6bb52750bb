use bigdecimal::BigDecimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::{Account, CreateAccount};

pub async fn fetch_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        "SELECT id, user_id, name, balance, is_default, created_at
         FROM accounts
         WHERE user_id = $1
         ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn fetch_one(pool: &PgPool, id: Uuid) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        "SELECT id, user_id, name, balance, is_default, created_at
         FROM accounts
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn fetch_default_for_user(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        "SELECT id, user_id, name, balance, is_default, created_at
         FROM accounts
         WHERE user_id = $1 AND is_default = TRUE",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Create an account. When the new account is flagged as default, the
/// previous default (if any) is cleared in the same transaction so a user
/// never has two defaults.
pub async fn create(
    pool: &PgPool,
    user_id: Uuid,
    input: CreateAccount,
) -> Result<Account, sqlx::Error> {
    let mut tx = pool.begin().await?;

    if input.is_default {
        sqlx::query("UPDATE accounts SET is_default = FALSE WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
    }

    let account = sqlx::query_as::<_, Account>(
        "INSERT INTO accounts (user_id, name, balance, is_default)
         VALUES ($1, $2, $3, $4)
         RETURNING id, user_id, name, balance, is_default, created_at",
    )
    .bind(user_id)
    .bind(input.name)
    .bind(input.balance.unwrap_or_default())
    .bind(input.is_default)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(account)
}

/// Apply a signed balance delta. Only called from within the atomic units
/// that also write the corresponding ledger row.
pub async fn adjust_balance(
    conn: &mut PgConnection,
    account_id: Uuid,
    delta: &BigDecimal,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE accounts SET balance = balance + $1 WHERE id = $2")
        .bind(delta)
        .bind(account_id)
        .execute(conn)
        .await?;
    Ok(())
}
