//! Tabular backing store: A1 addressing, cell values, a small formula
//! language, the [`Sheet`] grid model and the [`SheetStore`] seam.

pub mod a1;
pub mod error;
pub mod format;
pub mod formula;
pub mod memory;
pub mod sheet;
pub mod store;
pub mod value;

pub use a1::{column_index, column_letter, CellRef, GridRange};
pub use error::SheetError;
pub use format::{CellFormat, HorizontalAlign, VerticalAlign};
pub use memory::{MemoryWorkbook, StoreOp};
pub use sheet::{Cell, ClearMode, Sheet};
pub use store::SheetStore;
pub use value::CellValue;
