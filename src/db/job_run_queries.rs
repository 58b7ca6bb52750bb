use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

/// One row per job execution, for operators. Nothing user-facing reads this.
#[derive(Debug, Serialize, FromRow)]
pub struct JobRun {
    pub id: i32,
    pub job_name: String,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub items_processed: Option<i32>,
    pub items_failed: Option<i32>,
    pub error_message: Option<String>,
    pub duration_ms: Option<i64>,
}

pub async fn record_start(pool: &PgPool, job_name: &str) -> Result<i32, sqlx::Error> {
    sqlx::query_scalar::<_, i32>(
        "INSERT INTO job_runs (job_name, status) VALUES ($1, 'running') RETURNING id",
    )
    .bind(job_name)
    .fetch_one(pool)
    .await
}

pub async fn record_success(
    pool: &PgPool,
    id: i32,
    items_processed: i32,
    items_failed: i32,
    duration_ms: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE job_runs
         SET completed_at = NOW(),
             status = 'success',
             items_processed = $2,
             items_failed = $3,
             duration_ms = $4
         WHERE id = $1",
    )
    .bind(id)
    .bind(items_processed)
    .bind(items_failed)
    .bind(duration_ms)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn record_failure(
    pool: &PgPool,
    id: i32,
    error_message: &str,
    duration_ms: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE job_runs
         SET completed_at = NOW(),
             status = 'failed',
             error_message = $2,
             duration_ms = $3
         WHERE id = $1",
    )
    .bind(id)
    .bind(error_message)
    .bind(duration_ms)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn recent(pool: &PgPool, limit: i64) -> Result<Vec<JobRun>, sqlx::Error> {
    sqlx::query_as::<_, JobRun>(
        "SELECT id, job_name, status::TEXT AS status, started_at, completed_at,
                items_processed, items_failed, error_message, duration_ms
         FROM job_runs
         ORDER BY started_at DESC
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}
