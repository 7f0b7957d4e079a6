//! The grid model shared by every [`SheetStore`](crate::SheetStore) backend.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::a1::{CellRef, GridRange};
use crate::error::SheetError;
use crate::format::CellFormat;
use crate::formula::{self, Grid};
use crate::value::CellValue;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    #[serde(default, skip_serializing_if = "is_unset_value")]
    pub value: CellValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(default, skip_serializing_if = "CellFormat::is_unset")]
    pub format: CellFormat,
}

fn is_unset_value(value: &CellValue) -> bool {
    matches!(value, CellValue::Empty)
}

impl Cell {
    /// A value or formula is present. Formatting alone is not content.
    #[must_use]
    pub fn has_content(&self) -> bool {
        self.formula.is_some() || !self.value.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearMode {
    Contents,
    Formats,
    All,
}

impl ClearMode {
    fn contents(self) -> bool {
        matches!(self, Self::Contents | Self::All)
    }

    fn formats(self) -> bool {
        matches!(self, Self::Formats | Self::All)
    }
}

/// A named grid of cells with merges, formats and frozen rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    name: String,
    #[serde(default)]
    rows: Vec<Vec<Cell>>,
    #[serde(default)]
    merges: Vec<GridRange>,
    /// Formats applied to open-ended column ranges; they cover rows appended later.
    #[serde(default)]
    column_formats: Vec<(GridRange, CellFormat)>,
    #[serde(default)]
    frozen_rows: u32,
}

fn index(n: u32) -> usize {
    n as usize - 1
}

fn row_number(i: usize) -> u32 {
    u32::try_from(i + 1).unwrap_or(u32::MAX)
}

impl Sheet {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Last row holding a value or formula; 0 for a sheet with no content.
    #[must_use]
    pub fn last_row(&self) -> u32 {
        self.rows
            .iter()
            .rposition(|row| row.iter().any(Cell::has_content))
            .map_or(0, row_number)
    }

    /// Last column holding a value or formula in any row; 0 when empty.
    #[must_use]
    pub fn last_column(&self) -> u32 {
        self.rows
            .iter()
            .filter_map(|row| row.iter().rposition(Cell::has_content))
            .max()
            .map_or(0, row_number)
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.last_row() == 0
    }

    #[must_use]
    pub fn cell(&self, row: u32, col: u32) -> Option<&Cell> {
        if row == 0 || col == 0 {
            return None;
        }
        self.rows.get(index(row))?.get(index(col))
    }

    fn cell_mut(&mut self, row: u32, col: u32) -> &mut Cell {
        let (r, c) = (index(row), index(col));
        if self.rows.len() <= r {
            self.rows.resize_with(r + 1, Vec::new);
        }
        let cells = &mut self.rows[r];
        if cells.len() <= c {
            cells.resize_with(c + 1, Cell::default);
        }
        &mut cells[c]
    }

    /// The displayed value: formulas are evaluated.
    #[must_use]
    pub fn value(&self, row: u32, col: u32) -> CellValue {
        self.evaluated(row, col, 0)
    }

    #[must_use]
    pub fn formula(&self, row: u32, col: u32) -> Option<&str> {
        self.cell(row, col)?.formula.as_deref()
    }

    /// Column-range formats with the cell's own format laid over them.
    #[must_use]
    pub fn effective_format(&self, row: u32, col: u32) -> CellFormat {
        let mut format = CellFormat::default();
        for (range, rule) in &self.column_formats {
            if range.contains(row, col) {
                format.apply(rule);
            }
        }
        if let Some(cell) = self.cell(row, col) {
            format.apply(&cell.format);
        }
        format
    }

    pub fn set_value(&mut self, at: CellRef, value: CellValue) {
        let cell = self.cell_mut(at.row, at.col);
        cell.formula = None;
        cell.value = value;
    }

    pub fn set_formula(&mut self, at: CellRef, formula: &str) {
        let cell = self.cell_mut(at.row, at.col);
        cell.value = CellValue::Empty;
        cell.formula = Some(formula.to_owned());
    }

    /// Write a block of values with its top-left corner at `start`.
    pub fn write_values(&mut self, start: CellRef, values: &[Vec<CellValue>]) {
        for (dr, row) in (0u32..).zip(values) {
            for (dc, value) in (0u32..).zip(row) {
                self.set_value(CellRef::new(start.row + dr, start.col + dc), value.clone());
            }
        }
    }

    /// Write `values` into the row after the last row with content. Returns
    /// the row written.
    pub fn append_row(&mut self, values: &[CellValue]) -> u32 {
        let row = self.last_row() + 1;
        self.write_values(CellRef::new(row, 1), std::slice::from_ref(&values.to_vec()));
        row
    }

    /// Evaluated values for `range`. An open-ended range stops at the last
    /// row with content and reads as empty when that is above its start.
    #[must_use]
    pub fn read_range(&self, range: &GridRange) -> Vec<Vec<CellValue>> {
        let end_row = range.resolved_end_row(self.last_row());
        (range.start_row..=end_row)
            .map(|row| {
                (range.start_col..=range.end_col)
                    .map(|col| self.value(row, col))
                    .collect()
            })
            .collect()
    }

    #[must_use]
    pub fn read_formulas(&self, range: &GridRange) -> Vec<Vec<Option<String>>> {
        let end_row = range.resolved_end_row(self.last_row());
        (range.start_row..=end_row)
            .map(|row| {
                (range.start_col..=range.end_col)
                    .map(|col| self.formula(row, col).map(str::to_owned))
                    .collect()
            })
            .collect()
    }

    pub fn clear(&mut self, range: &GridRange, mode: ClearMode) {
        let allocated = u32::try_from(self.rows.len()).unwrap_or(u32::MAX);
        let end_row = range.resolved_end_row(allocated).min(allocated);
        for row in range.start_row..=end_row {
            let Some(cells) = self.rows.get_mut(index(row)) else {
                continue;
            };
            for col in range.start_col..=range.end_col {
                let Some(cell) = cells.get_mut(index(col)) else {
                    break;
                };
                if mode.contents() {
                    cell.value = CellValue::Empty;
                    cell.formula = None;
                }
                if mode.formats() {
                    cell.format = CellFormat::default();
                }
            }
        }
        if mode.formats() && range.end_row.is_none() {
            self.column_formats.retain(|(rule, _)| !rule.intersects(range));
        }
    }

    /// Merge `range` into one cell.
    ///
    /// # Errors
    ///
    /// [`SheetError::OverlappingMerge`] when `range` overlaps an existing
    /// merge, [`SheetError::InvalidRange`] for open-ended ranges.
    pub fn merge(&mut self, range: GridRange) -> Result<(), SheetError> {
        if range.end_row.is_none() {
            return Err(SheetError::InvalidRange(format!(
                "cannot merge open range {range}"
            )));
        }
        if self.merges.iter().any(|m| m.intersects(&range)) {
            return Err(SheetError::OverlappingMerge {
                sheet: self.name.clone(),
                range: range.to_string(),
            });
        }
        if range.end_row != Some(range.start_row) || range.end_col != range.start_col {
            self.merges.push(range);
        }
        Ok(())
    }

    /// Break up every merge that touches `range`.
    pub fn unmerge(&mut self, range: &GridRange) {
        self.merges.retain(|m| !m.intersects(range));
    }

    #[must_use]
    pub fn merges(&self) -> &[GridRange] {
        &self.merges
    }

    pub fn format(&mut self, range: &GridRange, format: &CellFormat) {
        let Some(end_row) = range.end_row else {
            match self.column_formats.iter_mut().find(|(r, _)| r == range) {
                Some((_, existing)) => existing.apply(format),
                None => self.column_formats.push((*range, format.clone())),
            }
            return;
        };
        for row in range.start_row..=end_row {
            for col in range.start_col..=range.end_col {
                self.cell_mut(row, col).format.apply(format);
            }
        }
    }

    pub fn freeze_rows(&mut self, rows: u32) {
        self.frozen_rows = rows;
    }

    #[must_use]
    pub fn frozen_rows(&self) -> u32 {
        self.frozen_rows
    }

    /// Reorder the rows of `range` by the values in `column`.
    ///
    /// Whole cells move with their row, formats included. Relative row
    /// references in moved formulas follow the row. Blanks sort last in both
    /// directions; equal keys keep their order.
    ///
    /// # Errors
    ///
    /// [`SheetError::InvalidRange`] when `column` lies outside `range`.
    pub fn sort(&mut self, range: &GridRange, column: u32, ascending: bool) -> Result<(), SheetError> {
        if column < range.start_col || column > range.end_col {
            return Err(SheetError::InvalidRange(format!(
                "sort column {column} is outside {range}"
            )));
        }
        let end_row = range.resolved_end_row(self.last_row());
        if end_row <= range.start_row {
            return Ok(());
        }

        let mut keyed: Vec<(u32, CellValue)> = (range.start_row..=end_row)
            .map(|row| (row, self.value(row, column)))
            .collect();
        keyed.sort_by(|(_, a), (_, b)| compare_sort_keys(a, b, ascending));

        let mut moved: Vec<Vec<Cell>> = Vec::with_capacity(keyed.len());
        for (row, _) in &keyed {
            let mut cells = Vec::with_capacity(range.num_cols() as usize);
            for col in range.start_col..=range.end_col {
                cells.push(std::mem::take(self.cell_mut(*row, col)));
            }
            moved.push(cells);
        }

        for (((old_row, _), cells), new_row) in keyed.iter().zip(moved).zip(range.start_row..) {
            let delta = i64::from(new_row) - i64::from(*old_row);
            for (mut cell, col) in cells.into_iter().zip(range.start_col..) {
                if let Some(f) = cell.formula.take() {
                    cell.formula = Some(formula::shift_rows(&f, delta));
                }
                *self.cell_mut(new_row, col) = cell;
            }
        }
        Ok(())
    }
}

impl Grid for Sheet {
    fn evaluated(&self, row: u32, col: u32, depth: u8) -> CellValue {
        match self.cell(row, col) {
            Some(Cell {
                formula: Some(f), ..
            }) => formula::evaluate(self, f, depth),
            Some(cell) => cell.value.clone(),
            None => CellValue::Empty,
        }
    }

    fn content_last_row(&self) -> u32 {
        self.last_row()
    }
}

fn sort_rank(value: &CellValue) -> u8 {
    match value {
        CellValue::Number(_) => 0,
        CellValue::DateTime(_) => 1,
        CellValue::Text(s) if !s.is_empty() => 2,
        CellValue::Error(_) => 3,
        CellValue::Empty | CellValue::Text(_) => 4,
    }
}

fn compare_sort_keys(a: &CellValue, b: &CellValue, ascending: bool) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        (false, false) => {}
    }
    let ordering = match (a, b) {
        (CellValue::Number(x), CellValue::Number(y)) => x.cmp(y),
        (CellValue::DateTime(x), CellValue::DateTime(y)) => x.cmp(y),
        (CellValue::Text(x), CellValue::Text(y)) => x.to_lowercase().cmp(&y.to_lowercase()),
        _ => sort_rank(a).cmp(&sort_rank(b)),
    };
    if ascending {
        ordering
    } else {
        ordering.reverse()
    }
}

#[cfg(test)]
#[path = "sheet_test.rs"]
mod tests;
