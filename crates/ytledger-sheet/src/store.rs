use std::future::Future;

use crate::a1::{CellRef, GridRange};
use crate::error::SheetError;
use crate::format::CellFormat;
use crate::sheet::ClearMode;
use crate::value::CellValue;

/// Range-level primitives over a workbook of named sheets.
///
/// Reads take `&self`; every mutation takes `&mut self`, so one run holds
/// exclusive access to the workbook for its duration. All operations on a
/// sheet that does not exist fail with [`SheetError::SheetNotFound`], except
/// [`insert_sheet`](Self::insert_sheet) and [`delete_sheet`](Self::delete_sheet).
pub trait SheetStore {
    /// Sheet names in tab order.
    fn sheet_names(&self) -> impl Future<Output = Result<Vec<String>, SheetError>> + Send;

    fn has_sheet(&self, sheet: &str) -> impl Future<Output = Result<bool, SheetError>> + Send;

    /// Create an empty sheet at `position` (end when `None`). Returns `false`
    /// without changes when the sheet already exists.
    fn insert_sheet(
        &mut self,
        sheet: &str,
        position: Option<usize>,
    ) -> impl Future<Output = Result<bool, SheetError>> + Send;

    /// Remove a sheet. Returns `false` when it did not exist.
    fn delete_sheet(&mut self, sheet: &str) -> impl Future<Output = Result<bool, SheetError>> + Send;

    /// Last row with content; 0 for an empty sheet.
    fn last_row(&self, sheet: &str) -> impl Future<Output = Result<u32, SheetError>> + Send;

    /// Last column with content in any row; 0 for an empty sheet.
    fn last_column(&self, sheet: &str) -> impl Future<Output = Result<u32, SheetError>> + Send;

    /// Evaluated values, one `Vec` per row.
    fn read_range(
        &self,
        sheet: &str,
        range: GridRange,
    ) -> impl Future<Output = Result<Vec<Vec<CellValue>>, SheetError>> + Send;

    /// Formula text per cell, `None` where a cell holds a plain value.
    fn read_formulas(
        &self,
        sheet: &str,
        range: GridRange,
    ) -> impl Future<Output = Result<Vec<Vec<Option<String>>>, SheetError>> + Send;

    fn write_values(
        &mut self,
        sheet: &str,
        start: CellRef,
        values: Vec<Vec<CellValue>>,
    ) -> impl Future<Output = Result<(), SheetError>> + Send;

    fn set_formula(
        &mut self,
        sheet: &str,
        at: CellRef,
        formula: &str,
    ) -> impl Future<Output = Result<(), SheetError>> + Send;

    /// Write `values` after the last row with content; returns that row.
    fn append_row(
        &mut self,
        sheet: &str,
        values: Vec<CellValue>,
    ) -> impl Future<Output = Result<u32, SheetError>> + Send;

    fn sort_range(
        &mut self,
        sheet: &str,
        range: GridRange,
        column: u32,
        ascending: bool,
    ) -> impl Future<Output = Result<(), SheetError>> + Send;

    fn clear_range(
        &mut self,
        sheet: &str,
        range: GridRange,
        mode: ClearMode,
    ) -> impl Future<Output = Result<(), SheetError>> + Send;

    fn merge_range(
        &mut self,
        sheet: &str,
        range: GridRange,
    ) -> impl Future<Output = Result<(), SheetError>> + Send;

    fn unmerge_range(
        &mut self,
        sheet: &str,
        range: GridRange,
    ) -> impl Future<Output = Result<(), SheetError>> + Send;

    fn format_range(
        &mut self,
        sheet: &str,
        range: GridRange,
        format: CellFormat,
    ) -> impl Future<Output = Result<(), SheetError>> + Send;

    fn freeze_rows(
        &mut self,
        sheet: &str,
        rows: u32,
    ) -> impl Future<Output = Result<(), SheetError>> + Send;
}
