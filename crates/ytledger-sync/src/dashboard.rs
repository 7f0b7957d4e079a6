//! Monthly cost roll-up from the ledgers into existing dashboard rows.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{Datelike, FixedOffset};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use ytledger_sheet::{column_letter, CellRef, CellValue, GridRange, SheetError, SheetStore};

use crate::layout::{
    LedgerLayout, DASHBOARD_FIRST_ROW, DASHBOARD_LONG_COL, DASHBOARD_MONTH_COL, DASHBOARD_NET_COL,
    DASHBOARD_REVENUE_COL,
};

/// A (month, year) bucket. Orders chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    #[must_use]
    pub fn new(month: u32, year: i32) -> Self {
        Self { year, month }
    }
}

impl std::fmt::Display for MonthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.month, self.year)
    }
}

pub type MonthlyTotals = BTreeMap<MonthKey, Decimal>;

/// Sum row totals by the month of their publish date.
///
/// `rows` are data rows starting at the date column. Rows whose date is not a
/// timestamp or whose total is not a number are skipped.
#[must_use]
pub fn aggregate_rows(rows: &[Vec<CellValue>], total_index: usize, offset: FixedOffset) -> MonthlyTotals {
    let mut totals = MonthlyTotals::new();
    for row in rows {
        let (Some(CellValue::DateTime(published)), Some(CellValue::Number(cost))) =
            (row.first(), row.get(total_index))
        else {
            continue;
        };
        let local = published.with_timezone(&offset);
        *totals
            .entry(MonthKey::new(local.month(), local.year()))
            .or_default() += *cost;
    }
    totals
}

/// Read a ledger and total it by month. A missing ledger totals to nothing.
///
/// # Errors
///
/// Propagates store failures.
pub async fn monthly_totals<S: SheetStore>(
    store: &S,
    sheet: &str,
    layout: LedgerLayout,
    offset: FixedOffset,
) -> Result<MonthlyTotals, SheetError> {
    if !store.has_sheet(sheet).await? {
        return Ok(MonthlyTotals::new());
    }
    let rows = store.read_range(sheet, layout.data_range()).await?;
    let total_index = (layout.total_col() - 1) as usize;
    Ok(aggregate_rows(&rows, total_index, offset))
}

/// `=C7 - D7 - E7`: manual revenue minus both cost totals.
#[must_use]
pub fn net_profit_formula(row: u32) -> String {
    let revenue = column_letter(DASHBOARD_REVENUE_COL);
    let long = column_letter(DASHBOARD_LONG_COL);
    let short = column_letter(DASHBOARD_LONG_COL + 1);
    format!("={revenue}{row} - {long}{row} - {short}{row}")
}

fn whole_number(value: &CellValue) -> Option<Decimal> {
    let n = match value {
        CellValue::Number(n) => *n,
        CellValue::Text(s) => Decimal::from_str(s.trim()).ok()?,
        _ => return None,
    };
    (n.fract().is_zero()).then_some(n)
}

fn month_key(cells: &[CellValue]) -> Option<MonthKey> {
    let month = whole_number(cells.first()?)?.to_u32()?;
    let year = whole_number(cells.get(1)?)?.to_i32()?;
    (1..=12).contains(&month).then(|| MonthKey::new(month, year))
}

/// Fill the long/short cost columns and the net-profit formula of every
/// dashboard row already present. Rows are matched on their own month and
/// year cells; unmatched or unreadable keys get zeros. No rows are created
/// and the revenue column is never written.
///
/// Returns the number of dashboard rows written.
///
/// # Errors
///
/// Propagates store failures.
pub async fn update_dashboard<S: SheetStore>(
    store: &mut S,
    sheet: &str,
    long_form: &MonthlyTotals,
    short_form: &MonthlyTotals,
) -> Result<u32, SheetError> {
    if !store.has_sheet(sheet).await? {
        tracing::warn!(sheet, "dashboard sheet missing; skipping totals");
        return Ok(0);
    }
    let last_row = store.last_row(sheet).await?;
    if last_row < DASHBOARD_FIRST_ROW {
        return Ok(0);
    }
    let count = last_row - DASHBOARD_FIRST_ROW + 1;

    let keys = store
        .read_range(
            sheet,
            GridRange::block(DASHBOARD_FIRST_ROW, DASHBOARD_MONTH_COL, count, 2),
        )
        .await?;
    let values: Vec<Vec<CellValue>> = keys
        .iter()
        .map(|cells| {
            let key = month_key(cells);
            let lookup = |totals: &MonthlyTotals| {
                key.and_then(|k| totals.get(&k).copied())
                    .unwrap_or(Decimal::ZERO)
            };
            vec![
                CellValue::Number(lookup(long_form)),
                CellValue::Number(lookup(short_form)),
            ]
        })
        .collect();

    store
        .write_values(sheet, CellRef::new(DASHBOARD_FIRST_ROW, DASHBOARD_LONG_COL), values)
        .await?;
    for row in DASHBOARD_FIRST_ROW..=last_row {
        store
            .set_formula(sheet, CellRef::new(row, DASHBOARD_NET_COL), &net_profit_formula(row))
            .await?;
    }

    tracing::info!(sheet, rows = count, "updated dashboard totals");
    Ok(count)
}
