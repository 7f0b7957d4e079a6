//! First-time workbook preparation: dashboard, both ledgers, banners.
//!
//! Every step is safe to repeat; existing data rows are never touched.

use chrono::{DateTime, Datelike, FixedOffset, Utc};
use ytledger_core::{Category, JobConfig};
use ytledger_sheet::{
    CellFormat, CellRef, CellValue, ClearMode, GridRange, HorizontalAlign, SheetError, SheetStore,
};

use crate::banner::redraw_banner;
use crate::dashboard::{net_profit_formula, MonthKey};
use crate::layout::{
    header_format, LedgerLayout, CURRENCY_FORMAT, DASHBOARD_FIRST_ROW, DASHBOARD_HEADERS,
    DASHBOARD_MONTH_COL, DASHBOARD_NET_COL, DASHBOARD_REVENUE_COL, DATA_START_ROW, DATE_COL,
    DATE_FORMAT, HEADER_ROW, VIEWS_COL, VIEWS_FORMAT,
};

/// Names a fresh workbook gives its first, empty sheet.
pub const DEFAULT_SHEET_NAMES: [&str; 2] = ["Sheet1", "Página1"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetupReport {
    pub created: Vec<String>,
    pub removed: Vec<String>,
    /// Month seeded into an empty dashboard.
    pub seeded: Option<MonthKey>,
}

/// Create and format whatever the job's sheets are missing.
///
/// # Errors
///
/// Propagates store failures.
pub async fn setup_workbook<S: SheetStore>(
    store: &mut S,
    job: &JobConfig,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Result<SetupReport, SheetError> {
    let mut report = SetupReport::default();

    let dashboard = job.sheets.dashboard.as_str();
    if store.insert_sheet(dashboard, Some(0)).await? {
        report.created.push(dashboard.to_owned());
    }
    report.seeded = setup_dashboard(store, dashboard, now, offset).await?;

    for category in Category::ALL {
        let sheet = job.sheets.ledger(category);
        if store.insert_sheet(sheet, None).await? {
            report.created.push(sheet.to_owned());
        }
        setup_ledger(store, sheet, category, job).await?;
    }

    for name in DEFAULT_SHEET_NAMES {
        let configured = name == dashboard || Category::ALL.iter().any(|c| job.sheets.ledger(*c) == name);
        if configured || !store.has_sheet(name).await? {
            continue;
        }
        if store.last_row(name).await? == 0 && store.delete_sheet(name).await? {
            report.removed.push(name.to_owned());
        }
    }

    tracing::info!(
        created = ?report.created,
        removed = ?report.removed,
        seeded = ?report.seeded,
        "workbook setup complete"
    );
    Ok(report)
}

async fn setup_dashboard<S: SheetStore>(
    store: &mut S,
    sheet: &str,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Result<Option<MonthKey>, SheetError> {
    let headers: Vec<CellValue> = DASHBOARD_HEADERS.iter().map(|h| CellValue::from(*h)).collect();
    let header_width = u32::try_from(headers.len()).unwrap_or(u32::MAX);
    store
        .write_values(sheet, CellRef::new(1, 1), vec![headers])
        .await?;
    store
        .format_range(
            sheet,
            GridRange::block(1, 1, 1, header_width),
            header_format("#111827", "#fbbf24"),
        )
        .await?;
    store.freeze_rows(sheet, 1).await?;

    store
        .format_range(
            sheet,
            GridRange::open(1, DASHBOARD_REVENUE_COL, DASHBOARD_NET_COL),
            CellFormat::number(CURRENCY_FORMAT),
        )
        .await?;
    store
        .format_range(
            sheet,
            GridRange::open(1, DASHBOARD_MONTH_COL, DASHBOARD_MONTH_COL + 1),
            CellFormat {
                horizontal_align: Some(HorizontalAlign::Center),
                ..CellFormat::default()
            },
        )
        .await?;
    store
        .format_range(
            sheet,
            GridRange::open(1, DASHBOARD_REVENUE_COL, DASHBOARD_REVENUE_COL),
            CellFormat {
                background: Some("#fffbeb".to_owned()),
                ..CellFormat::default()
            },
        )
        .await?;

    if store.last_row(sheet).await? != 1 {
        return Ok(None);
    }
    let local = now.with_timezone(&offset);
    let key = MonthKey::new(local.month(), local.year());
    store
        .write_values(
            sheet,
            CellRef::new(DASHBOARD_FIRST_ROW, DASHBOARD_MONTH_COL),
            vec![vec![
                CellValue::from(u64::from(key.month)),
                CellValue::from(i64::from(key.year)),
                CellValue::from(0u64),
            ]],
        )
        .await?;
    store
        .set_formula(
            sheet,
            CellRef::new(DASHBOARD_FIRST_ROW, DASHBOARD_NET_COL),
            &net_profit_formula(DASHBOARD_FIRST_ROW),
        )
        .await?;
    Ok(Some(key))
}

async fn setup_ledger<S: SheetStore>(
    store: &mut S,
    sheet: &str,
    category: Category,
    job: &JobConfig,
) -> Result<(), SheetError> {
    let rules = job.costs.rules(category);
    let layout = LedgerLayout::new(rules);
    store
        .write_values(
            sheet,
            CellRef::new(HEADER_ROW, 1),
            vec![LedgerLayout::headers(rules)],
        )
        .await?;
    // Header cells of removed roles; their data columns wait for reconcile.
    let last_col = store.last_column(sheet).await?;
    if last_col > layout.total_col() {
        let stale = GridRange::block(
            HEADER_ROW,
            layout.total_col() + 1,
            1,
            last_col - layout.total_col(),
        );
        store.clear_range(sheet, stale, ClearMode::All).await?;
    }
    apply_ledger_formats(store, sheet, layout).await?;
    redraw_banner(store, sheet, category, layout).await
}

/// Header style, frozen header rows and the column formats of the data region.
pub(crate) async fn apply_ledger_formats<S: SheetStore>(
    store: &mut S,
    sheet: &str,
    layout: LedgerLayout,
) -> Result<(), SheetError> {
    store
        .format_range(sheet, layout.header_range(), header_format("#1f2937", "#e5e7eb"))
        .await?;
    store.freeze_rows(sheet, HEADER_ROW).await?;
    store
        .format_range(
            sheet,
            GridRange::open(DATA_START_ROW, DATE_COL, DATE_COL),
            CellFormat::number(DATE_FORMAT),
        )
        .await?;
    store
        .format_range(
            sheet,
            GridRange::open(DATA_START_ROW, VIEWS_COL, VIEWS_COL),
            CellFormat::number(VIEWS_FORMAT),
        )
        .await?;
    store
        .format_range(sheet, layout.cost_range(), CellFormat::number(CURRENCY_FORMAT))
        .await
}
