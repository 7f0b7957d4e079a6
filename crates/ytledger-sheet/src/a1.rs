//! A1-notation cell and range addressing. Rows and columns are 1-based.

use serde::{Deserialize, Serialize};

/// Column number to letters: 1 → `A`, 27 → `AA`. Returns an empty string for 0.
#[must_use]
pub fn column_letter(col: u32) -> String {
    let mut letters = Vec::new();
    let mut n = col;
    while n > 0 {
        let rem = (n - 1) % 26;
        // rem < 26, so the cast cannot truncate.
        #[allow(clippy::cast_possible_truncation)]
        letters.push(char::from(b'A' + rem as u8));
        n = (n - rem - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Letters to column number: `A` → 1, `AA` → 27. Case-insensitive.
#[must_use]
pub fn column_index(letters: &str) -> Option<u32> {
    if letters.is_empty() || letters.len() > 3 {
        return None;
    }
    letters.chars().try_fold(0u32, |acc, c| {
        let c = c.to_ascii_uppercase();
        c.is_ascii_uppercase()
            .then(|| acc * 26 + (u32::from(c) - u32::from('A') + 1))
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRef {
    pub row: u32,
    pub col: u32,
}

impl CellRef {
    #[must_use]
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Parses `B7` or `$B$7`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().replace('$', "");
        let split = s.find(|c: char| c.is_ascii_digit())?;
        let (letters, digits) = s.split_at(split);
        let col = column_index(letters)?;
        let row = digits.parse::<u32>().ok().filter(|r| *r > 0)?;
        Some(Self { row, col })
    }
}

impl std::fmt::Display for CellRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", column_letter(self.col), self.row)
    }
}

/// A rectangular range. `end_row: None` is an open-ended column range such as
/// `H5:H`, which extends to the sheet's last row with content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridRange {
    pub start_row: u32,
    pub start_col: u32,
    pub end_row: Option<u32>,
    pub end_col: u32,
}

impl GridRange {
    /// A single cell.
    #[must_use]
    pub fn cell(row: u32, col: u32) -> Self {
        Self {
            start_row: row,
            start_col: col,
            end_row: Some(row),
            end_col: col,
        }
    }

    /// `num_rows × num_cols` cells anchored at (`row`, `col`). Zero-sized
    /// requests are clamped to one row/column.
    #[must_use]
    pub fn block(row: u32, col: u32, num_rows: u32, num_cols: u32) -> Self {
        Self {
            start_row: row,
            start_col: col,
            end_row: Some(row + num_rows.max(1) - 1),
            end_col: col + num_cols.max(1) - 1,
        }
    }

    /// From `start_row` down to the last row with content.
    #[must_use]
    pub fn open(start_row: u32, start_col: u32, end_col: u32) -> Self {
        Self {
            start_row,
            start_col,
            end_row: None,
            end_col,
        }
    }

    /// Parses `A1`, `A1:F2` or `H5:H`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let Some((start, end)) = s.split_once(':') else {
            let cell = CellRef::parse(s)?;
            return Some(Self::cell(cell.row, cell.col));
        };
        let start = CellRef::parse(start)?;
        let end_clean = end.trim().replace('$', "");
        if end_clean.chars().all(|c| c.is_ascii_alphabetic()) {
            let end_col = column_index(&end_clean)?;
            return Some(Self::open(start.row, start.col.min(end_col), start.col.max(end_col)));
        }
        let end = CellRef::parse(&end_clean)?;
        Some(Self {
            start_row: start.row.min(end.row),
            start_col: start.col.min(end.col),
            end_row: Some(start.row.max(end.row)),
            end_col: start.col.max(end.col),
        })
    }

    #[must_use]
    pub fn num_cols(&self) -> u32 {
        self.end_col + 1 - self.start_col
    }

    /// Concrete last row, resolving an open end against `last_row`.
    #[must_use]
    pub fn resolved_end_row(&self, last_row: u32) -> u32 {
        self.end_row.unwrap_or(last_row)
    }

    #[must_use]
    pub fn contains(&self, row: u32, col: u32) -> bool {
        row >= self.start_row
            && self.end_row.is_none_or(|end| row <= end)
            && col >= self.start_col
            && col <= self.end_col
    }

    #[must_use]
    pub fn intersects(&self, other: &GridRange) -> bool {
        let rows_overlap = self.end_row.is_none_or(|end| other.start_row <= end)
            && other.end_row.is_none_or(|end| self.start_row <= end);
        let cols_overlap = self.start_col <= other.end_col && other.start_col <= self.end_col;
        rows_overlap && cols_overlap
    }
}

impl std::fmt::Display for GridRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let start = CellRef::new(self.start_row, self.start_col);
        match self.end_row {
            Some(end_row) => {
                let end = CellRef::new(end_row, self.end_col);
                if end == start {
                    write!(f, "{start}")
                } else {
                    write!(f, "{start}:{end}")
                }
            }
            None => write!(f, "{start}:{}", column_letter(self.end_col)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_letters_round_trip_at_boundaries() {
        assert_eq!(column_letter(1), "A");
        assert_eq!(column_letter(26), "Z");
        assert_eq!(column_letter(27), "AA");
        assert_eq!(column_letter(52), "AZ");
        assert_eq!(column_letter(703), "AAA");
        assert_eq!(column_index("A"), Some(1));
        assert_eq!(column_index("az"), Some(52));
        assert_eq!(column_index("AAA"), Some(703));
        assert_eq!(column_index(""), None);
        assert_eq!(column_index("A1"), None);
    }

    #[test]
    fn parses_cell_refs() {
        assert_eq!(CellRef::parse("B7"), Some(CellRef::new(7, 2)));
        assert_eq!(CellRef::parse("$H$5"), Some(CellRef::new(5, 8)));
        assert_eq!(CellRef::parse("H0"), None);
        assert_eq!(CellRef::parse("7"), None);
    }

    #[test]
    fn parses_ranges() {
        assert_eq!(GridRange::parse("A1:F1"), Some(GridRange::block(1, 1, 1, 6)));
        assert_eq!(GridRange::parse("H5:H"), Some(GridRange::open(5, 8, 8)));
        assert_eq!(GridRange::parse("C2"), Some(GridRange::cell(2, 3)));
        assert_eq!(GridRange::parse("F1:A1"), Some(GridRange::block(1, 1, 1, 6)));
    }

    #[test]
    fn displays_ranges() {
        assert_eq!(GridRange::block(1, 1, 2, 8).to_string(), "A1:H2");
        assert_eq!(GridRange::open(5, 8, 8).to_string(), "H5:H");
        assert_eq!(GridRange::cell(3, 4).to_string(), "D3");
    }

    #[test]
    fn open_ranges_intersect_everything_below() {
        let banner = GridRange::block(1, 1, 1, 8);
        let column = GridRange::open(5, 8, 8);
        assert!(!banner.intersects(&column));
        assert!(column.intersects(&GridRange::cell(500, 8)));
        assert!(GridRange::block(1, 1, 2, 8).intersects(&GridRange::block(2, 3, 1, 1)));
        assert!(column.contains(10_000, 8));
        assert!(!column.contains(4, 8));
    }
}
