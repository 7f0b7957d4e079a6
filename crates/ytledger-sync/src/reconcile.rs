//! Full rewrite of every ledger row to the current cost rules.
//!
//! Appended rows snapshot the rule values of the day they were created; this
//! pass overrides those snapshots so every row matches the current schedule.

use ytledger_core::CostRule;
use ytledger_sheet::{CellRef, CellValue, ClearMode, GridRange, SheetError, SheetStore};

use crate::layout::{LedgerLayout, BANNER_TITLE_ROW, DATA_START_ROW, DATE_COL, FIRST_COST_COL, HEADER_ROW, LINK_COL};
use crate::setup::apply_ledger_formats;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileCounts {
    /// Data rows rewritten.
    pub rows: u32,
    /// Stale columns cleared past the total column.
    pub cleared_columns: u32,
}

/// Force cost cells, totals and the header of `sheet` to match `rules`.
///
/// Rows count as existing when they carry a link or a date; fully blank rows
/// inside the data region are left blank. Columns past the new total column
/// (left over from removed roles) are cleared from the banner down, values
/// and formats both. Running it twice yields identical cells.
///
/// # Errors
///
/// Propagates store failures.
pub async fn reconcile_costs<S: SheetStore>(
    store: &mut S,
    sheet: &str,
    rules: &[CostRule],
) -> Result<ReconcileCounts, SheetError> {
    let layout = LedgerLayout::new(rules);
    let last_row = store.last_row(sheet).await?;
    let last_col = store.last_column(sheet).await?;
    let mut counts = ReconcileCounts::default();

    if last_col > layout.total_col() {
        let ghost = GridRange::open(BANNER_TITLE_ROW, layout.total_col() + 1, last_col);
        store.clear_range(sheet, ghost, ClearMode::All).await?;
        counts.cleared_columns = last_col - layout.total_col();
    }

    store
        .write_values(
            sheet,
            CellRef::new(HEADER_ROW, 1),
            vec![LedgerLayout::headers(rules)],
        )
        .await?;

    if last_row >= DATA_START_ROW {
        let keys = store
            .read_range(sheet, GridRange::open(DATA_START_ROW, DATE_COL, LINK_COL))
            .await?;
        let existing: Vec<bool> = keys
            .iter()
            .map(|cells| cells.iter().any(|v| !v.is_empty()))
            .collect();

        let cost_cells: Vec<CellValue> = rules.iter().map(|r| CellValue::Number(r.value)).collect();
        let block: Vec<Vec<CellValue>> = existing
            .iter()
            .map(|&present| {
                let mut row = if present {
                    cost_cells.clone()
                } else {
                    vec![CellValue::Empty; cost_cells.len()]
                };
                // The total cell: literal 0 without cost columns, otherwise a
                // placeholder the formula below replaces.
                row.push(if present && layout.cost_count() == 0 {
                    CellValue::from(0u64)
                } else {
                    CellValue::Empty
                });
                row
            })
            .collect();
        store
            .write_values(sheet, CellRef::new(DATA_START_ROW, FIRST_COST_COL), block)
            .await?;

        for (row, present) in (DATA_START_ROW..).zip(&existing) {
            if !present {
                continue;
            }
            counts.rows += 1;
            if let Some(formula) = layout.total_formula(row) {
                store
                    .set_formula(sheet, CellRef::new(row, layout.total_col()), &formula)
                    .await?;
            }
        }
    }

    apply_ledger_formats(store, sheet, layout).await?;

    tracing::info!(
        sheet,
        rows = counts.rows,
        cleared_columns = counts.cleared_columns,
        "reconciled ledger costs"
    );
    Ok(counts)
}
