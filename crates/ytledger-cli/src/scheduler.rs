//! Daily sync daemon.
//!
//! Registers the sync job on the configured cron expression, read in the
//! ledger's UTC offset, and starts a [`JobScheduler`]. Each tick runs one
//! recorded sync; a failing tick is logged and the next tick runs as usual.

use std::sync::Arc;

use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use uuid::Uuid;
use ytledger_core::AppConfig;

use crate::runner;

/// Builds and starts the scheduler with the daily sync job.
///
/// The returned handle must be kept alive; dropping it stops the job.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the cron expression is invalid or the
/// scheduler cannot be started.
pub(crate) async fn build_scheduler(
    pool: PgPool,
    config: Arc<AppConfig>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    let id = register_sync_job(&scheduler, pool, config).await?;
    tracing::debug!(job_id = %id, "scheduler: sync job registered");
    scheduler.start().await?;
    Ok(scheduler)
}

/// Add the sync job and return its id. One daemon process registers exactly
/// one sync job.
async fn register_sync_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    config: Arc<AppConfig>,
) -> Result<Uuid, JobSchedulerError> {
    let pool = Arc::new(pool);
    let cron = config.sync_cron.clone();
    let offset = config.utc_offset();
    let job = Job::new_async_tz(cron.as_str(), offset, move |_uuid, _lock| {
        let pool = Arc::clone(&pool);
        let config = Arc::clone(&config);

        Box::pin(async move {
            tracing::info!("scheduler: starting sync run");
            match runner::run_recorded(&pool, &config, "scheduler").await {
                Ok(outcome) => {
                    tracing::info!(
                        outcome = %runner::summary(&outcome),
                        "scheduler: sync run complete"
                    );
                }
                Err(e) => {
                    tracing::error!(error = %e, "scheduler: sync run could not start");
                }
            }
        })
    })?;

    scheduler.add(job).await
}
