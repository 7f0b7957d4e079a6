//! The job entry point: resolve, fetch, upsert, sort, reconcile, banner,
//! dashboard.

use chrono::{DateTime, FixedOffset, Utc};
use thiserror::Error;
use ytledger_catalog::{
    fetch_uploads_since, resolve_channel_id, year_start_cutoff, CatalogError, CatalogService,
};
use ytledger_core::{Category, JobConfig, VideoRecord};
use ytledger_sheet::{SheetError, SheetStore};

use crate::banner::redraw_banner;
use crate::dashboard::{monthly_totals, update_dashboard, MonthlyTotals};
use crate::layout::LedgerLayout;
use crate::reconcile::reconcile_costs;
use crate::upsert::{sort_ledger, upsert_ledger};

/// Where a run stopped. Resolution never aborts: it skips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStage {
    Fetch,
    Upsert,
    Sort,
    Reconcile,
    Banner,
    Dashboard,
}

impl SyncStage {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SyncStage::Fetch => "fetch",
            SyncStage::Upsert => "upsert",
            SyncStage::Sort => "sort",
            SyncStage::Reconcile => "reconcile",
            SyncStage::Banner => "banner",
            SyncStage::Dashboard => "dashboard",
        }
    }
}

impl std::fmt::Display for SyncStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Sheet(#[from] SheetError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    ChannelNotFound { channel: String },
    /// Another process holds the workbook lock.
    AlreadyRunning,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::ChannelNotFound { channel } => write!(f, "channel not found: {channel}"),
            SkipReason::AlreadyRunning => f.write_str("another sync run holds the workbook"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerStatus {
    Synced,
    /// The ledger sheet does not exist; its videos were skipped.
    MissingSheet,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerReport {
    pub category: Category,
    pub sheet: String,
    pub status: LedgerStatus,
    pub videos: usize,
    pub appended: usize,
    pub updated: usize,
    pub reconciled_rows: u32,
    pub cleared_columns: u32,
}

impl LedgerReport {
    fn new(category: Category, sheet: &str, status: LedgerStatus) -> Self {
        Self {
            category,
            sheet: sheet.to_owned(),
            status,
            videos: 0,
            appended: 0,
            updated: 0,
            reconciled_rows: 0,
            cleared_columns: 0,
        }
    }
}

/// What a run did, as far as it got.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub channel_id: Option<String>,
    pub cutoff: Option<DateTime<Utc>>,
    pub videos_fetched: usize,
    pub ledgers: Vec<LedgerReport>,
    pub dashboard_rows: u32,
}

impl SyncReport {
    #[must_use]
    pub fn appended(&self) -> usize {
        self.ledgers.iter().map(|l| l.appended).sum()
    }

    #[must_use]
    pub fn updated(&self) -> usize {
        self.ledgers.iter().map(|l| l.updated).sum()
    }

    /// Some ledger was skipped because its sheet is missing.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.ledgers
            .iter()
            .any(|l| l.status == LedgerStatus::MissingSheet)
    }

    #[must_use]
    pub fn ledger(&self, category: Category) -> Option<&LedgerReport> {
        self.ledgers.iter().find(|l| l.category == category)
    }
}

/// Result of [`run_sync`]. A run never fails past this boundary.
#[derive(Debug)]
pub enum SyncOutcome {
    Completed(SyncReport),
    /// Nothing was written.
    Skipped(SkipReason),
    /// The run stopped at `stage`; whatever `report` lists was already written.
    Aborted {
        stage: SyncStage,
        error: SyncError,
        report: SyncReport,
    },
}

impl SyncOutcome {
    #[must_use]
    pub fn report(&self) -> Option<&SyncReport> {
        match self {
            SyncOutcome::Completed(report) | SyncOutcome::Aborted { report, .. } => Some(report),
            SyncOutcome::Skipped(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SyncOptions {
    pub now: DateTime<Utc>,
    /// Zone of the ledger's calendar: cutoff year and month buckets.
    pub utc_offset: FixedOffset,
}

type StageResult<T> = Result<T, (SyncStage, SyncError)>;

fn at<E: Into<SyncError>>(stage: SyncStage) -> impl FnOnce(E) -> (SyncStage, SyncError) {
    move |e| (stage, e.into())
}

/// Run one synchronization pass for `job`.
///
/// An unresolvable channel skips the run before any write. Any catalog or
/// store failure aborts the run at that stage; writes already made stand and
/// the next run repairs them, since every stage is idempotent.
pub async fn run_sync<C, S>(
    catalog: &C,
    store: &mut S,
    job: &JobConfig,
    options: SyncOptions,
) -> SyncOutcome
where
    C: CatalogService,
    S: SheetStore,
{
    let mut report = SyncReport::default();
    match execute(catalog, store, job, options, &mut report).await {
        Ok(None) => {
            tracing::info!(
                channel = %job.channel,
                fetched = report.videos_fetched,
                appended = report.appended(),
                updated = report.updated(),
                partial = report.is_partial(),
                "sync completed"
            );
            SyncOutcome::Completed(report)
        }
        Ok(Some(reason)) => {
            tracing::warn!(channel = %job.channel, %reason, "sync skipped");
            SyncOutcome::Skipped(reason)
        }
        Err((stage, error)) => {
            tracing::error!(channel = %job.channel, %stage, error = %error, "sync aborted");
            SyncOutcome::Aborted {
                stage,
                error,
                report,
            }
        }
    }
}

async fn execute<C, S>(
    catalog: &C,
    store: &mut S,
    job: &JobConfig,
    options: SyncOptions,
    report: &mut SyncReport,
) -> StageResult<Option<SkipReason>>
where
    C: CatalogService,
    S: SheetStore,
{
    let Some(channel_id) = resolve_channel_id(catalog, &job.channel).await else {
        return Ok(Some(SkipReason::ChannelNotFound {
            channel: job.channel.clone(),
        }));
    };
    report.channel_id = Some(channel_id.clone());

    let cutoff = year_start_cutoff(options.now, options.utc_offset);
    report.cutoff = Some(cutoff);
    let videos = fetch_uploads_since(catalog, &channel_id, cutoff)
        .await
        .map_err(at(SyncStage::Fetch))?;
    report.videos_fetched = videos.len();

    for category in Category::ALL {
        let sheet = job.sheets.ledger(category);
        let status = if store.has_sheet(sheet).await.map_err(at(SyncStage::Upsert))? {
            LedgerStatus::Synced
        } else {
            tracing::warn!(sheet, %category, "ledger sheet missing; skipping category");
            LedgerStatus::MissingSheet
        };
        report.ledgers.push(LedgerReport::new(category, sheet, status));
    }

    for ledger in synced(report) {
        let rules = job.costs.rules(ledger.category);
        let batch: Vec<&VideoRecord> = videos
            .iter()
            .filter(|v| v.category() == ledger.category)
            .collect();
        ledger.videos = batch.len();
        let counts = upsert_ledger(store, &ledger.sheet, rules, &batch)
            .await
            .map_err(at(SyncStage::Upsert))?;
        ledger.appended = counts.appended;
        ledger.updated = counts.updated;
    }

    for ledger in synced(report) {
        let layout = LedgerLayout::new(job.costs.rules(ledger.category));
        sort_ledger(store, &ledger.sheet, layout)
            .await
            .map_err(at(SyncStage::Sort))?;
    }

    for ledger in synced(report) {
        let counts = reconcile_costs(store, &ledger.sheet, job.costs.rules(ledger.category))
            .await
            .map_err(at(SyncStage::Reconcile))?;
        ledger.reconciled_rows = counts.rows;
        ledger.cleared_columns = counts.cleared_columns;
    }

    for ledger in synced(report) {
        let layout = LedgerLayout::new(job.costs.rules(ledger.category));
        redraw_banner(store, &ledger.sheet, ledger.category, layout)
            .await
            .map_err(at(SyncStage::Banner))?;
    }

    let mut totals: [MonthlyTotals; 2] = Default::default();
    for (slot, category) in totals.iter_mut().zip(Category::ALL) {
        let layout = LedgerLayout::new(job.costs.rules(category));
        *slot = monthly_totals(&*store, job.sheets.ledger(category), layout, options.utc_offset)
            .await
            .map_err(at(SyncStage::Dashboard))?;
    }
    let [long_form, short_form] = &totals;
    report.dashboard_rows = update_dashboard(store, &job.sheets.dashboard, long_form, short_form)
        .await
        .map_err(at(SyncStage::Dashboard))?;

    Ok(None)
}

fn synced(report: &mut SyncReport) -> impl Iterator<Item = &mut LedgerReport> {
    report
        .ledgers
        .iter_mut()
        .filter(|l| l.status == LedgerStatus::Synced)
}
