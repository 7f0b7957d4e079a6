//! The ledger sync engine: upsert, reconciliation, banner and dashboard
//! passes over any [`ytledger_sheet::SheetStore`].

pub mod banner;
pub mod dashboard;
pub mod job;
pub mod layout;
pub mod reconcile;
pub mod setup;
pub mod upsert;

pub use banner::redraw_banner;
pub use dashboard::{aggregate_rows, monthly_totals, update_dashboard, MonthKey, MonthlyTotals};
pub use job::{
    run_sync, LedgerReport, LedgerStatus, SkipReason, SyncError, SyncOptions, SyncOutcome,
    SyncReport, SyncStage,
};
pub use layout::LedgerLayout;
pub use reconcile::{reconcile_costs, ReconcileCounts};
pub use setup::{setup_workbook, SetupReport, DEFAULT_SHEET_NAMES};
pub use upsert::{sort_ledger, upsert_ledger, DedupIndex, UpsertCounts};
