//! Idempotent insertion of fetched videos into a ledger, keyed by watch URL.

use std::collections::HashMap;

use ytledger_core::{CostRule, VideoRecord};
use ytledger_sheet::{CellRef, CellValue, GridRange, SheetError, SheetStore};

use crate::layout::{LedgerLayout, DATA_START_ROW, DATE_COL, HEADER_ROW, LINK_COL, VIEWS_COL};

/// Watch URL → ledger row, built once per ledger per run and kept current as
/// rows are appended. When stored data already holds a URL twice, the first
/// row wins.
#[derive(Debug, Clone, Default)]
pub struct DedupIndex {
    rows: HashMap<String, u32>,
    last_row: u32,
}

impl DedupIndex {
    /// Scan the link column of `sheet`.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn load<S: SheetStore>(store: &S, sheet: &str) -> Result<Self, SheetError> {
        let last_row = store.last_row(sheet).await?;
        let mut rows = HashMap::new();
        if last_row >= DATA_START_ROW {
            let links = store
                .read_range(sheet, GridRange::open(DATA_START_ROW, LINK_COL, LINK_COL))
                .await?;
            for (row, cells) in (DATA_START_ROW..).zip(links) {
                if let Some(CellValue::Text(url)) = cells.first() {
                    let key = url.trim();
                    if !key.is_empty() {
                        rows.entry(key.to_owned()).or_insert(row);
                    }
                }
            }
        }
        Ok(Self { rows, last_row })
    }

    #[must_use]
    pub fn row_of(&self, url: &str) -> Option<u32> {
        self.rows.get(url).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn record(&mut self, url: String, row: u32) {
        self.rows.insert(url, row);
        self.last_row = self.last_row.max(row);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertCounts {
    pub appended: usize,
    pub updated: usize,
}

/// Upsert `videos` into the ledger `sheet`.
///
/// Unknown URLs get a new row carrying the current cost values as a snapshot
/// and a total formula over the row's own cost cells. Known URLs only get
/// their view count rewritten.
///
/// # Errors
///
/// Propagates store failures. Rows written before the failure stay written.
pub async fn upsert_ledger<S: SheetStore>(
    store: &mut S,
    sheet: &str,
    rules: &[CostRule],
    videos: &[&VideoRecord],
) -> Result<UpsertCounts, SheetError> {
    let layout = LedgerLayout::new(rules);
    let mut index = DedupIndex::load(&*store, sheet).await?;
    let mut counts = UpsertCounts::default();

    for video in videos {
        let url = video.watch_url();
        let views = CellValue::from(video.view_count);

        if let Some(row) = index.row_of(&url) {
            store
                .write_values(sheet, CellRef::new(row, VIEWS_COL), vec![vec![views]])
                .await?;
            counts.updated += 1;
            continue;
        }

        let mut values = vec![
            CellValue::DateTime(video.published_at),
            CellValue::from(video.title.as_str()),
            CellValue::from(url.as_str()),
            views,
        ];
        values.extend(rules.iter().map(|r| CellValue::Number(r.value)));
        if layout.cost_count() == 0 {
            values.push(CellValue::from(0u64));
        }

        // Without a header row an append would land above the data region.
        let row = if index.last_row >= HEADER_ROW {
            store.append_row(sheet, values).await?
        } else {
            let row = DATA_START_ROW.max(index.last_row + 1);
            store
                .write_values(sheet, CellRef::new(row, DATE_COL), vec![values])
                .await?;
            row
        };
        if let Some(formula) = layout.total_formula(row) {
            store
                .set_formula(sheet, CellRef::new(row, layout.total_col()), &formula)
                .await?;
        }

        index.record(url, row);
        counts.appended += 1;
    }

    tracing::info!(
        sheet,
        appended = counts.appended,
        updated = counts.updated,
        "upserted ledger rows"
    );
    Ok(counts)
}

/// Re-sort the whole data region by publish date, oldest first.
///
/// Columns past the total are included so stale cells keep their row.
///
/// # Errors
///
/// Propagates store failures.
pub async fn sort_ledger<S: SheetStore>(
    store: &mut S,
    sheet: &str,
    layout: LedgerLayout,
) -> Result<(), SheetError> {
    let last_col = store.last_column(sheet).await?.max(layout.total_col());
    store
        .sort_range(sheet, GridRange::open(DATA_START_ROW, DATE_COL, last_col), DATE_COL, true)
        .await?;
    tracing::debug!(sheet, "sorted ledger by publish date");
    Ok(())
}
