use thiserror::Error;

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("sheet not found: {0}")]
    SheetNotFound(String),

    #[error("invalid range: {0}")]
    InvalidRange(String),

    /// Merging over an existing merge region is rejected; unmerge first.
    #[error("range {range} on sheet {sheet} overlaps an existing merge")]
    OverlappingMerge { sheet: String, range: String },

    #[error("storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}
