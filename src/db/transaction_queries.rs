use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::db::account_queries;
use crate::models::{CreateTransaction, Transaction};

const COLUMNS: &str = "id, user_id, account_id, transaction_type, amount, description, date, \
                       category, is_recurring, recurring_interval, last_processed, \
                       next_recurring_date, status, created_at";

pub async fn fetch_one(pool: &PgPool, id: Uuid) -> Result<Option<Transaction>, sqlx::Error> {
    sqlx::query_as::<_, Transaction>(&format!(
        "SELECT {COLUMNS} FROM transactions WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn fetch_for_account(
    pool: &PgPool,
    account_id: Uuid,
) -> Result<Vec<Transaction>, sqlx::Error> {
    sqlx::query_as::<_, Transaction>(&format!(
        "SELECT {COLUMNS} FROM transactions WHERE account_id = $1 ORDER BY date DESC"
    ))
    .bind(account_id)
    .fetch_all(pool)
    .await
}

/// The due-transaction selector: recurring, completed, and either never
/// processed or past its next scheduled occurrence. Read-only; racing with
/// the applier is harmless because the applier re-checks on claim.
pub async fn fetch_due_recurring(
    pool: &PgPool,
    now: DateTime<Utc>,
) -> Result<Vec<Transaction>, sqlx::Error> {
    sqlx::query_as::<_, Transaction>(&format!(
        "SELECT {COLUMNS} FROM transactions
         WHERE is_recurring = TRUE
           AND status = 'COMPLETED'
           AND (last_processed IS NULL OR next_recurring_date <= $1)
         ORDER BY next_recurring_date ASC NULLS FIRST"
    ))
    .bind(now)
    .fetch_all(pool)
    .await
}

pub async fn fetch_in_range_for_user(
    pool: &PgPool,
    user_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<Transaction>, sqlx::Error> {
    sqlx::query_as::<_, Transaction>(&format!(
        "SELECT {COLUMNS} FROM transactions
         WHERE user_id = $1 AND date >= $2 AND date < $3
         ORDER BY date ASC"
    ))
    .bind(user_id)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await
}

/// Total EXPENSE amount for one account within [start, end).
pub async fn sum_expenses_for_account(
    pool: &PgPool,
    user_id: Uuid,
    account_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<BigDecimal, sqlx::Error> {
    sqlx::query_scalar::<_, BigDecimal>(
        "SELECT COALESCE(SUM(amount), 0)
         FROM transactions
         WHERE user_id = $1
           AND account_id = $2
           AND transaction_type = 'EXPENSE'
           AND date >= $3
           AND date < $4",
    )
    .bind(user_id)
    .bind(account_id)
    .bind(start)
    .bind(end)
    .fetch_one(pool)
    .await
}

/// Insert a user-created ledger entry and adjust the owning account's
/// balance in one transaction. Recurring templates arrive with their first
/// `next_recurring_date` already computed by the caller.
pub async fn create_with_balance(
    pool: &PgPool,
    user_id: Uuid,
    input: CreateTransaction,
    next_recurring_date: Option<DateTime<Utc>>,
) -> Result<Transaction, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let transaction = sqlx::query_as::<_, Transaction>(&format!(
        "INSERT INTO transactions
             (user_id, account_id, transaction_type, amount, description, date, category,
              is_recurring, recurring_interval, next_recurring_date, status)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'COMPLETED')
         RETURNING {COLUMNS}"
    ))
    .bind(user_id)
    .bind(input.account_id)
    .bind(input.transaction_type)
    .bind(&input.amount)
    .bind(&input.description)
    .bind(input.date)
    .bind(&input.category)
    .bind(input.is_recurring)
    .bind(input.recurring_interval)
    .bind(next_recurring_date)
    .fetch_one(&mut *tx)
    .await?;

    account_queries::adjust_balance(&mut *tx, transaction.account_id, &transaction.signed_amount())
        .await?;

    tx.commit().await?;
    Ok(transaction)
}

/// Delete a ledger entry and reverse its balance contribution in one
/// transaction. Returns the deleted row, or None if it did not exist.
pub async fn delete_with_balance(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<Transaction>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let deleted = sqlx::query_as::<_, Transaction>(&format!(
        "DELETE FROM transactions WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;

    if let Some(transaction) = &deleted {
        account_queries::adjust_balance(
            &mut *tx,
            transaction.account_id,
            &(-transaction.signed_amount()),
        )
        .await?;
    }

    tx.commit().await?;
    Ok(deleted)
}

/// Conditionally claim a due recurring template for processing.
///
/// The WHERE clause repeats the full due predicate, so under concurrent
/// runs only one claimant gets the row back: the loser's UPDATE re-reads
/// the committed row, finds the predicate false, and matches nothing.
pub async fn claim_due(
    conn: &mut PgConnection,
    id: Uuid,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Option<Transaction>, sqlx::Error> {
    sqlx::query_as::<_, Transaction>(&format!(
        "UPDATE transactions
         SET last_processed = $3
         WHERE id = $1
           AND user_id = $2
           AND is_recurring = TRUE
           AND status = 'COMPLETED'
           AND (last_processed IS NULL OR next_recurring_date <= $3)
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(user_id)
    .bind(now)
    .fetch_optional(conn)
    .await
}

/// Insert the realized (non-recurring) instance of a recurring template.
pub async fn insert_realized(
    conn: &mut PgConnection,
    template: &Transaction,
    now: DateTime<Utc>,
) -> Result<Transaction, sqlx::Error> {
    let description = match &template.description {
        Some(text) => format!("{text} (Recurring)"),
        None => "(Recurring)".to_string(),
    };

    sqlx::query_as::<_, Transaction>(&format!(
        "INSERT INTO transactions
             (user_id, account_id, transaction_type, amount, description, date, category,
              is_recurring, status)
         VALUES ($1, $2, $3, $4, $5, $6, $7, FALSE, 'COMPLETED')
         RETURNING {COLUMNS}"
    ))
    .bind(template.user_id)
    .bind(template.account_id)
    .bind(template.transaction_type)
    .bind(&template.amount)
    .bind(description)
    .bind(now)
    .bind(&template.category)
    .fetch_one(conn)
    .await
}

pub async fn set_next_recurring(
    conn: &mut PgConnection,
    id: Uuid,
    next: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE transactions SET next_recurring_date = $1 WHERE id = $2")
        .bind(next)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}
