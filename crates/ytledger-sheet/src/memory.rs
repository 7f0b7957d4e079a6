//! In-process workbook used for dry runs and tests.

use std::collections::HashSet;

use crate::a1::{CellRef, GridRange};
use crate::error::SheetError;
use crate::format::CellFormat;
use crate::sheet::{ClearMode, Sheet};
use crate::store::SheetStore;
use crate::value::CellValue;

/// Write operations that can be made to fail with [`MemoryWorkbook::fail`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    WriteValues,
    SetFormula,
    AppendRow,
    SortRange,
    ClearRange,
    MergeRange,
    FormatRange,
    FreezeRows,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryWorkbook {
    sheets: Vec<Sheet>,
    failing: HashSet<StoreOp>,
}

impl MemoryWorkbook {
    /// A workbook holding the default empty `Sheet1`, like a fresh spreadsheet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sheets: vec![Sheet::new("Sheet1")],
            failing: HashSet::new(),
        }
    }

    /// Make every later `op` call fail with a backend error, leaving the
    /// cells untouched.
    pub fn fail(&mut self, op: StoreOp) {
        self.failing.insert(op);
    }

    /// Clear all failures set with [`fail`](Self::fail).
    pub fn recover(&mut self) {
        self.failing.clear();
    }

    #[must_use]
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name() == name)
    }

    fn get(&self, name: &str) -> Result<&Sheet, SheetError> {
        self.sheet(name)
            .ok_or_else(|| SheetError::SheetNotFound(name.to_owned()))
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut Sheet, SheetError> {
        self.sheets
            .iter_mut()
            .find(|s| s.name() == name)
            .ok_or_else(|| SheetError::SheetNotFound(name.to_owned()))
    }

    fn check(&self, op: StoreOp) -> Result<(), SheetError> {
        if self.failing.contains(&op) {
            return Err(SheetError::Backend(format!("simulated {op:?} failure").into()));
        }
        Ok(())
    }
}

impl SheetStore for MemoryWorkbook {
    async fn sheet_names(&self) -> Result<Vec<String>, SheetError> {
        Ok(self.sheets.iter().map(|s| s.name().to_owned()).collect())
    }

    async fn has_sheet(&self, sheet: &str) -> Result<bool, SheetError> {
        Ok(self.sheet(sheet).is_some())
    }

    async fn insert_sheet(&mut self, sheet: &str, position: Option<usize>) -> Result<bool, SheetError> {
        if self.sheet(sheet).is_some() {
            return Ok(false);
        }
        let at = position.map_or(self.sheets.len(), |p| p.min(self.sheets.len()));
        self.sheets.insert(at, Sheet::new(sheet));
        Ok(true)
    }

    async fn delete_sheet(&mut self, sheet: &str) -> Result<bool, SheetError> {
        let before = self.sheets.len();
        self.sheets.retain(|s| s.name() != sheet);
        Ok(self.sheets.len() != before)
    }

    async fn last_row(&self, sheet: &str) -> Result<u32, SheetError> {
        Ok(self.get(sheet)?.last_row())
    }

    async fn last_column(&self, sheet: &str) -> Result<u32, SheetError> {
        Ok(self.get(sheet)?.last_column())
    }

    async fn read_range(&self, sheet: &str, range: GridRange) -> Result<Vec<Vec<CellValue>>, SheetError> {
        Ok(self.get(sheet)?.read_range(&range))
    }

    async fn read_formulas(
        &self,
        sheet: &str,
        range: GridRange,
    ) -> Result<Vec<Vec<Option<String>>>, SheetError> {
        Ok(self.get(sheet)?.read_formulas(&range))
    }

    async fn write_values(
        &mut self,
        sheet: &str,
        start: CellRef,
        values: Vec<Vec<CellValue>>,
    ) -> Result<(), SheetError> {
        self.check(StoreOp::WriteValues)?;
        self.get_mut(sheet)?.write_values(start, &values);
        Ok(())
    }

    async fn set_formula(&mut self, sheet: &str, at: CellRef, formula: &str) -> Result<(), SheetError> {
        self.check(StoreOp::SetFormula)?;
        self.get_mut(sheet)?.set_formula(at, formula);
        Ok(())
    }

    async fn append_row(&mut self, sheet: &str, values: Vec<CellValue>) -> Result<u32, SheetError> {
        self.check(StoreOp::AppendRow)?;
        Ok(self.get_mut(sheet)?.append_row(&values))
    }

    async fn sort_range(
        &mut self,
        sheet: &str,
        range: GridRange,
        column: u32,
        ascending: bool,
    ) -> Result<(), SheetError> {
        self.check(StoreOp::SortRange)?;
        self.get_mut(sheet)?.sort(&range, column, ascending)
    }

    async fn clear_range(&mut self, sheet: &str, range: GridRange, mode: ClearMode) -> Result<(), SheetError> {
        self.check(StoreOp::ClearRange)?;
        self.get_mut(sheet)?.clear(&range, mode);
        Ok(())
    }

    async fn merge_range(&mut self, sheet: &str, range: GridRange) -> Result<(), SheetError> {
        self.check(StoreOp::MergeRange)?;
        self.get_mut(sheet)?.merge(range)
    }

    async fn unmerge_range(&mut self, sheet: &str, range: GridRange) -> Result<(), SheetError> {
        self.get_mut(sheet)?.unmerge(&range);
        Ok(())
    }

    async fn format_range(
        &mut self,
        sheet: &str,
        range: GridRange,
        format: CellFormat,
    ) -> Result<(), SheetError> {
        self.check(StoreOp::FormatRange)?;
        self.get_mut(sheet)?.format(&range, &format);
        Ok(())
    }

    async fn freeze_rows(&mut self, sheet: &str, rows: u32) -> Result<(), SheetError> {
        self.check(StoreOp::FreezeRows)?;
        self.get_mut(sheet)?.freeze_rows(rows);
        Ok(())
    }
}
