use ytledger_core::Category;
use ytledger_sheet::{CellRef, CellValue, ClearMode, GridRange, SheetError, SheetStore};

use crate::layout::{
    banner_title, banner_total_format, header_format, LedgerLayout, BANNER_TITLE_ROW,
    BANNER_TOTAL_ROW,
};

const TITLE_BACKGROUND: &str = "#374151";
const TITLE_FONT: &str = "#ffffff";

/// Redraw the two-row banner of a ledger: the merged title and the merged
/// running total over the whole total column.
///
/// The previous banner region is unmerged and cleared first, out to the
/// widest column in use, since merging over an existing merge fails.
///
/// # Errors
///
/// Propagates store failures, including [`SheetError::OverlappingMerge`].
pub async fn redraw_banner<S: SheetStore>(
    store: &mut S,
    sheet: &str,
    category: Category,
    layout: LedgerLayout,
) -> Result<(), SheetError> {
    let width = layout.total_col();
    let stale_width = store.last_column(sheet).await?.max(width);
    let region = GridRange::block(BANNER_TITLE_ROW, 1, 2, stale_width);
    store.unmerge_range(sheet, region).await?;
    store.clear_range(sheet, region, ClearMode::All).await?;

    let title = GridRange::block(BANNER_TITLE_ROW, 1, 1, width);
    store.merge_range(sheet, title).await?;
    store
        .write_values(
            sheet,
            CellRef::new(BANNER_TITLE_ROW, 1),
            vec![vec![CellValue::from(banner_title(sheet))]],
        )
        .await?;
    store
        .format_range(sheet, title, header_format(TITLE_BACKGROUND, TITLE_FONT))
        .await?;

    let total = GridRange::block(BANNER_TOTAL_ROW, 1, 1, width);
    store.merge_range(sheet, total).await?;
    store
        .set_formula(sheet, CellRef::new(BANNER_TOTAL_ROW, 1), &layout.banner_formula())
        .await?;
    store
        .format_range(sheet, total, banner_total_format(category))
        .await?;

    tracing::debug!(sheet, width, "redrew banner");
    Ok(())
}
