//! Database operations for `sync_runs`, the outcome log of job invocations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `sync_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SyncRunRow {
    pub id: i64,
    pub public_id: Uuid,
    pub trigger_source: String,
    pub channel: String,
    pub status: String,
    pub videos_fetched: i32,
    pub rows_appended: i32,
    pub rows_updated: i32,
    pub failed_stage: Option<String>,
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Counters recorded when a run finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncRunCounts {
    pub videos_fetched: i32,
    pub rows_appended: i32,
    pub rows_updated: i32,
}

const COLUMNS: &str = "id, public_id, trigger_source, channel, status, videos_fetched, \
                       rows_appended, rows_updated, failed_stage, error_message, \
                       started_at, completed_at";

/// Creates a new run in `running` status with `started_at = NOW()`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_sync_run(
    pool: &PgPool,
    trigger_source: &str,
    channel: &str,
) -> Result<SyncRunRow, DbError> {
    let row = sqlx::query_as::<_, SyncRunRow>(&format!(
        "INSERT INTO sync_runs (public_id, trigger_source, channel, status) \
         VALUES ($1, $2, $3, 'running') \
         RETURNING {COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(trigger_source)
    .bind(channel)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Marks a running run as `succeeded` and records its counters.
///
/// # Errors
///
/// Returns [`DbError::InvalidSyncRunTransition`] if the run is not `running`,
/// or [`DbError::Sqlx`] if the update fails.
pub async fn complete_sync_run(pool: &PgPool, id: i64, counts: SyncRunCounts) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE sync_runs \
         SET status = 'succeeded', completed_at = NOW(), \
             videos_fetched = $1, rows_appended = $2, rows_updated = $3 \
         WHERE id = $4 AND status = 'running'",
    )
    .bind(counts.videos_fetched)
    .bind(counts.rows_appended)
    .bind(counts.rows_updated)
    .bind(id)
    .execute(pool)
    .await?;

    ensure_transition(result.rows_affected(), id)
}

/// Marks a running run as `skipped` (nothing to do, e.g. unresolved channel).
///
/// # Errors
///
/// Returns [`DbError::InvalidSyncRunTransition`] if the run is not `running`,
/// or [`DbError::Sqlx`] if the update fails.
pub async fn skip_sync_run(pool: &PgPool, id: i64, reason: &str) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE sync_runs \
         SET status = 'skipped', completed_at = NOW(), error_message = $1 \
         WHERE id = $2 AND status = 'running'",
    )
    .bind(reason)
    .bind(id)
    .execute(pool)
    .await?;

    ensure_transition(result.rows_affected(), id)
}

/// Marks a running run as `failed` at `stage`.
///
/// # Errors
///
/// Returns [`DbError::InvalidSyncRunTransition`] if the run is not `running`,
/// or [`DbError::Sqlx`] if the update fails.
pub async fn fail_sync_run(
    pool: &PgPool,
    id: i64,
    stage: &str,
    error_message: &str,
    counts: SyncRunCounts,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE sync_runs \
         SET status = 'failed', completed_at = NOW(), failed_stage = $1, error_message = $2, \
             videos_fetched = $3, rows_appended = $4, rows_updated = $5 \
         WHERE id = $6 AND status = 'running'",
    )
    .bind(stage)
    .bind(error_message)
    .bind(counts.videos_fetched)
    .bind(counts.rows_appended)
    .bind(counts.rows_updated)
    .bind(id)
    .execute(pool)
    .await?;

    ensure_transition(result.rows_affected(), id)
}

/// Error message recorded on runs closed by [`abandon_running_sync_runs`].
pub const ABANDONED_RUN_MESSAGE: &str = "abandoned: process exited before recording an outcome";

/// Marks every `running` run as `failed`. Call only while holding the
/// workbook lock: no other process can still be working on those runs.
///
/// Returns the number of runs closed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn abandon_running_sync_runs(pool: &PgPool) -> Result<u64, DbError> {
    let result = sqlx::query(
        "UPDATE sync_runs \
         SET status = 'failed', completed_at = NOW(), error_message = $1 \
         WHERE status = 'running'",
    )
    .bind(ABANDONED_RUN_MESSAGE)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

fn ensure_transition(rows_affected: u64, id: i64) -> Result<(), DbError> {
    if rows_affected == 0 {
        return Err(DbError::InvalidSyncRunTransition {
            id,
            expected_status: "running",
        });
    }
    Ok(())
}

/// Fetches a single run by its internal `id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_sync_run(pool: &PgPool, id: i64) -> Result<SyncRunRow, DbError> {
    sqlx::query_as::<_, SyncRunRow>(&format!("SELECT {COLUMNS} FROM sync_runs WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// Returns the most recent `limit` runs, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_sync_runs(pool: &PgPool, limit: i64) -> Result<Vec<SyncRunRow>, DbError> {
    let rows = sqlx::query_as::<_, SyncRunRow>(&format!(
        "SELECT {COLUMNS} FROM sync_runs ORDER BY started_at DESC, id DESC LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
