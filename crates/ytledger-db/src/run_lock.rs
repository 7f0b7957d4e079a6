//! Session-level advisory lock serializing sync runs against the workbook.
//!
//! All channels share one stored workbook, so the lock is workbook-wide. It
//! lives on a dedicated pooled connection; Postgres releases it when that
//! session ends, so a crashed process cannot hold it forever.

use sqlx::pool::PoolConnection;
use sqlx::{PgPool, Postgres};

use crate::DbError;

/// Advisory lock key for the workbook ("ytledger" in ASCII).
pub const WORKBOOK_LOCK_KEY: i64 = 0x7974_6c65_6467_6572;

/// Holds the workbook lock until [`release`](Self::release) or drop.
///
/// Dropping without releasing closes the underlying connection instead of
/// returning it to the pool, which ends the session and frees the lock.
#[derive(Debug)]
pub struct WorkbookLock {
    conn: Option<PoolConnection<Postgres>>,
}

/// Try to take the workbook lock without waiting.
///
/// Returns `None` when another session holds it.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if no connection can be acquired or the query
/// fails.
pub async fn try_lock_workbook(pool: &PgPool) -> Result<Option<WorkbookLock>, DbError> {
    let mut conn = pool.acquire().await?;
    let acquired = sqlx::query_scalar::<_, bool>("SELECT pg_try_advisory_lock($1)")
        .bind(WORKBOOK_LOCK_KEY)
        .fetch_one(&mut *conn)
        .await?;

    if !acquired {
        return Ok(None);
    }
    Ok(Some(WorkbookLock { conn: Some(conn) }))
}

impl WorkbookLock {
    /// Release the lock and return the connection to the pool.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlx`] if the unlock query fails. The connection is
    /// closed in that case, which frees the lock anyway.
    pub async fn release(mut self) -> Result<(), DbError> {
        let Some(mut conn) = self.conn.take() else {
            return Ok(());
        };
        let released = sqlx::query_scalar::<_, bool>("SELECT pg_advisory_unlock($1)")
            .bind(WORKBOOK_LOCK_KEY)
            .fetch_one(&mut *conn)
            .await;
        match released {
            Ok(true) => Ok(()),
            Ok(false) => {
                tracing::warn!("workbook lock was not held at release");
                Ok(())
            }
            Err(e) => {
                drop(conn.detach());
                Err(e.into())
            }
        }
    }
}

impl Drop for WorkbookLock {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            tracing::debug!("workbook lock dropped unreleased; closing its connection");
            drop(conn.detach());
        }
    }
}
