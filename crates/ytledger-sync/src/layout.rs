//! Fixed positions of the ledger and dashboard sheets.
//!
//! Ledger rows 1–2 hold the banner, row 4 the header and rows 5.. the data.
//! Columns are date, title, link, views, one column per cost rule, then the
//! row total.

use ytledger_core::{Category, CostRule};
use ytledger_sheet::{column_letter, CellFormat, CellValue, GridRange, HorizontalAlign, VerticalAlign};

pub const BANNER_TITLE_ROW: u32 = 1;
pub const BANNER_TOTAL_ROW: u32 = 2;
pub const HEADER_ROW: u32 = 4;
pub const DATA_START_ROW: u32 = 5;

pub const DATE_COL: u32 = 1;
pub const LINK_COL: u32 = 3;
pub const VIEWS_COL: u32 = 4;
pub const FIRST_COST_COL: u32 = 5;

pub const DASHBOARD_HEADERS: [&str; 6] = [
    "Mês",
    "Ano",
    "Faturamento (Manual)",
    "Custos (Longos)",
    "Custos (Shorts)",
    "Lucro Líquido",
];
pub const DASHBOARD_FIRST_ROW: u32 = 2;
pub const DASHBOARD_MONTH_COL: u32 = 1;
pub const DASHBOARD_REVENUE_COL: u32 = 3;
pub const DASHBOARD_LONG_COL: u32 = 4;
pub const DASHBOARD_NET_COL: u32 = 6;

pub const CURRENCY_FORMAT: &str = "R$ #,##0.00";
pub const DATE_FORMAT: &str = "dd/MM/yyyy";
pub const VIEWS_FORMAT: &str = "#,##0";

const BASE_HEADERS: [&str; 4] = ["Data", "Título", "Link", "Visualizações"];
const TOTAL_HEADER: &str = "Custo Total Vídeo";

/// Column geometry of one ledger for a given cost rule list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerLayout {
    cost_count: u32,
}

impl LedgerLayout {
    #[must_use]
    pub fn new(rules: &[CostRule]) -> Self {
        Self {
            cost_count: u32::try_from(rules.len()).unwrap_or(u32::MAX - FIRST_COST_COL),
        }
    }

    #[must_use]
    pub fn cost_count(&self) -> u32 {
        self.cost_count
    }

    /// Column of the per-row total; `E` when there are no cost rules.
    #[must_use]
    pub fn total_col(&self) -> u32 {
        FIRST_COST_COL + self.cost_count
    }

    /// Header labels: the fixed columns, one per role, then the total.
    #[must_use]
    pub fn headers(rules: &[CostRule]) -> Vec<CellValue> {
        BASE_HEADERS
            .iter()
            .map(|h| CellValue::from(*h))
            .chain(rules.iter().map(|r| CellValue::from(r.role.as_str())))
            .chain(std::iter::once(CellValue::from(TOTAL_HEADER)))
            .collect()
    }

    /// `=SUM(E7:G7)` over the row's own cost cells, or `None` when the
    /// ledger has no cost columns and the total is the literal 0.
    #[must_use]
    pub fn total_formula(&self, row: u32) -> Option<String> {
        if self.cost_count == 0 {
            return None;
        }
        let first = column_letter(FIRST_COST_COL);
        let last = column_letter(self.total_col() - 1);
        Some(format!("=SUM({first}{row}:{last}{row})"))
    }

    /// Sum of the whole total column, from the first data row down.
    #[must_use]
    pub fn banner_formula(&self) -> String {
        let total = column_letter(self.total_col());
        format!("=SUM({total}{DATA_START_ROW}:{total})")
    }

    /// The data region: every data row, date through total.
    #[must_use]
    pub fn data_range(&self) -> GridRange {
        GridRange::open(DATA_START_ROW, DATE_COL, self.total_col())
    }

    #[must_use]
    pub fn header_range(&self) -> GridRange {
        GridRange::block(HEADER_ROW, 1, 1, self.total_col())
    }

    #[must_use]
    pub fn cost_range(&self) -> GridRange {
        GridRange::open(DATA_START_ROW, FIRST_COST_COL, self.total_col())
    }
}

#[must_use]
pub fn banner_title(sheet: &str) -> String {
    format!("ACUMULADO TOTAL ({})", sheet.to_uppercase())
}

pub(crate) fn header_format(background: &str, font_color: &str) -> CellFormat {
    CellFormat {
        background: Some(background.to_owned()),
        font_color: Some(font_color.to_owned()),
        bold: Some(true),
        horizontal_align: Some(HorizontalAlign::Center),
        ..CellFormat::default()
    }
}

pub(crate) fn banner_total_format(category: Category) -> CellFormat {
    let background = match category {
        Category::LongForm => "#166534",
        Category::ShortForm => "#991b1b",
    };
    CellFormat {
        number_format: Some(CURRENCY_FORMAT.to_owned()),
        font_size: Some(18),
        vertical_align: Some(VerticalAlign::Middle),
        ..header_format(background, "#ffffff")
    }
}
