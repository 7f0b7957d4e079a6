//! One sync run wired to its real collaborators: the job file, the catalog
//! client, the Postgres workbook and the run log.

use chrono::Utc;
use ytledger_catalog::YoutubeClient;
use ytledger_core::AppConfig;
use ytledger_db::{SyncRunCounts, SyncRunRow};
use ytledger_sheet::MemoryWorkbook;
use ytledger_sync::{run_sync, setup_workbook, SkipReason, SyncOptions, SyncOutcome, SyncReport};

fn build_catalog_client(config: &AppConfig) -> anyhow::Result<YoutubeClient> {
    Ok(YoutubeClient::with_base_url(
        &config.youtube_api_key,
        config.request_timeout_secs,
        &config.user_agent,
        &config.youtube_base_url,
    )?)
}

fn sync_options(config: &AppConfig) -> SyncOptions {
    SyncOptions {
        now: Utc::now(),
        utc_offset: config.utc_offset(),
    }
}

/// Load the job, run it against the stored workbook and record the outcome
/// in `sync_runs`. The job file is re-read on every call so edits take effect
/// on the next scheduled run.
///
/// Runs are serialized through the workbook lock. When another process holds
/// it, the run is recorded as skipped and nothing is fetched or written.
/// Holding the lock also means any run still marked `running` was left by a
/// process that died, so those are closed as failed first.
///
/// # Errors
///
/// Fails before the run starts when the job file, the catalog client, the
/// lock or the run log insert fail. Sync failures are returned inside the
/// outcome.
pub(crate) async fn run_recorded(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    trigger_source: &str,
) -> anyhow::Result<SyncOutcome> {
    let job = ytledger_core::load_job_config(&config.job_path)?;
    let client = build_catalog_client(config)?;

    let Some(lock) = ytledger_db::try_lock_workbook(pool).await? else {
        let run = ytledger_db::create_sync_run(pool, trigger_source, &job.channel).await?;
        tracing::warn!(run_id = run.id, channel = %job.channel, "workbook locked by another sync run");
        let outcome = SyncOutcome::Skipped(SkipReason::AlreadyRunning);
        record_outcome(pool, run.id, &outcome).await;
        return Ok(outcome);
    };

    let abandoned = ytledger_db::abandon_running_sync_runs(pool).await?;
    if abandoned > 0 {
        tracing::warn!(abandoned, "closed sync runs left running by an earlier process");
    }

    let run = ytledger_db::create_sync_run(pool, trigger_source, &job.channel).await?;
    tracing::info!(run_id = run.id, channel = %job.channel, trigger_source, "sync run started");

    let mut workbook = ytledger_db::PgWorkbook::new(pool.clone());
    let outcome = run_sync(&client, &mut workbook, &job, sync_options(config)).await;
    record_outcome(pool, run.id, &outcome).await;
    if let Err(e) = lock.release().await {
        tracing::warn!(run_id = run.id, error = %e, "failed to release workbook lock");
    }
    Ok(outcome)
}

/// Sync into a freshly set up in-memory workbook. Nothing is persisted.
///
/// # Errors
///
/// Fails when the job file or the catalog client cannot be loaded.
pub(crate) async fn dry_run(config: &AppConfig) -> anyhow::Result<SyncOutcome> {
    let job = ytledger_core::load_job_config(&config.job_path)?;
    let client = build_catalog_client(config)?;
    let options = sync_options(config);

    let mut workbook = MemoryWorkbook::new();
    setup_workbook(&mut workbook, &job, options.now, options.utc_offset).await?;
    Ok(run_sync(&client, &mut workbook, &job, options).await)
}

async fn record_outcome(pool: &sqlx::PgPool, run_id: i64, outcome: &SyncOutcome) {
    let result = match outcome {
        SyncOutcome::Completed(report) => {
            if report.is_partial() {
                tracing::warn!(run_id, "sync completed with missing ledger sheets");
            }
            ytledger_db::complete_sync_run(pool, run_id, run_counts(report)).await
        }
        SyncOutcome::Skipped(reason) => {
            ytledger_db::skip_sync_run(pool, run_id, &reason.to_string()).await
        }
        SyncOutcome::Aborted {
            stage,
            error,
            report,
        } => {
            ytledger_db::fail_sync_run(
                pool,
                run_id,
                stage.as_str(),
                &error.to_string(),
                run_counts(report),
            )
            .await
        }
    };

    if let Err(e) = result {
        tracing::error!(run_id, error = %e, "failed to record sync run outcome");
    }
}

fn saturating_i32(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

fn run_counts(report: &SyncReport) -> SyncRunCounts {
    SyncRunCounts {
        videos_fetched: saturating_i32(report.videos_fetched),
        rows_appended: saturating_i32(report.appended()),
        rows_updated: saturating_i32(report.updated()),
    }
}

pub(crate) fn summary(outcome: &SyncOutcome) -> String {
    match outcome {
        SyncOutcome::Completed(report) => {
            let partial = if report.is_partial() {
                " (some ledger sheets missing)"
            } else {
                ""
            };
            format!(
                "completed: {} fetched, {} appended, {} updated{partial}",
                report.videos_fetched,
                report.appended(),
                report.updated()
            )
        }
        SyncOutcome::Skipped(reason) => format!("skipped: {reason}"),
        SyncOutcome::Aborted { stage, error, .. } => format!("aborted at {stage}: {error}"),
    }
}

pub(crate) fn format_run(run: &SyncRunRow) -> String {
    let mut line = format!(
        "#{} {} [{}] {} fetched={} appended={} updated={} started={}",
        run.id,
        run.status,
        run.trigger_source,
        run.channel,
        run.videos_fetched,
        run.rows_appended,
        run.rows_updated,
        run.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
    );
    if let Some(stage) = &run.failed_stage {
        line.push_str(&format!(" stage={stage}"));
    }
    if let Some(message) = &run.error_message {
        line.push_str(&format!(" error={message:?}"));
    }
    line
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use ytledger_core::Category;
    use ytledger_sheet::SheetError;
    use ytledger_sync::{LedgerReport, LedgerStatus, SyncError, SyncStage};

    use super::*;

    fn ledger(category: Category, status: LedgerStatus, appended: usize, updated: usize) -> LedgerReport {
        LedgerReport {
            category,
            sheet: category.to_string(),
            status,
            videos: appended + updated,
            appended,
            updated,
            reconciled_rows: 0,
            cleared_columns: 0,
        }
    }

    fn report() -> SyncReport {
        SyncReport {
            channel_id: Some("UC1".to_string()),
            cutoff: None,
            videos_fetched: 7,
            ledgers: vec![
                ledger(Category::LongForm, LedgerStatus::Synced, 2, 3),
                ledger(Category::ShortForm, LedgerStatus::Synced, 1, 1),
            ],
            dashboard_rows: 1,
        }
    }

    #[test]
    fn counts_sum_both_ledgers() {
        assert_eq!(
            run_counts(&report()),
            SyncRunCounts {
                videos_fetched: 7,
                rows_appended: 3,
                rows_updated: 4,
            }
        );
    }

    #[test]
    fn summary_flags_partial_runs() {
        let mut partial = report();
        partial.ledgers[1] = ledger(Category::ShortForm, LedgerStatus::MissingSheet, 0, 0);
        let text = summary(&SyncOutcome::Completed(partial));
        assert_eq!(
            text,
            "completed: 7 fetched, 2 appended, 3 updated (some ledger sheets missing)"
        );
    }

    #[test]
    fn summary_names_abort_stage_and_skip_reason() {
        let aborted = SyncOutcome::Aborted {
            stage: SyncStage::Dashboard,
            error: SyncError::Sheet(SheetError::SheetNotFound("Dashboard".to_string())),
            report: report(),
        };
        assert_eq!(
            summary(&aborted),
            "aborted at dashboard: sheet not found: Dashboard"
        );

        let skipped = SyncOutcome::Skipped(SkipReason::ChannelNotFound {
            channel: "@gone".to_string(),
        });
        assert_eq!(summary(&skipped), "skipped: channel not found: @gone");
    }

    #[test]
    fn summary_reports_a_locked_workbook() {
        let skipped = SyncOutcome::Skipped(SkipReason::AlreadyRunning);
        assert_eq!(
            summary(&skipped),
            "skipped: another sync run holds the workbook"
        );
    }

    #[test]
    fn failed_run_line_includes_stage_and_error() {
        let run = SyncRunRow {
            id: 4,
            public_id: uuid::Uuid::nil(),
            trigger_source: "scheduler".to_string(),
            channel: "@chan".to_string(),
            status: "failed".to_string(),
            videos_fetched: 3,
            rows_appended: 0,
            rows_updated: 0,
            failed_stage: Some("fetch".to_string()),
            error_message: Some("timeout".to_string()),
            started_at: Utc.with_ymd_and_hms(2025, 6, 1, 3, 0, 0).unwrap(),
            completed_at: None,
        };
        assert_eq!(
            format_run(&run),
            "#4 failed [scheduler] @chan fetched=3 appended=0 updated=0 \
             started=2025-06-01 03:00:00 UTC stage=fetch error=\"timeout\""
        );
    }
}
