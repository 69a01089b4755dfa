//! Export error types.

use thiserror::Error;

/// Errors raised while writing the workbook.
#[derive(Error, Debug)]
pub enum ExportError {
    /// No records to write
    #[error("nothing to export: dataset is empty")]
    EmptyDataset,

    /// A record carries a key the column layout does not know
    #[error("record {row} has column '{key}' missing from the header")]
    UnknownColumn {
        /// 0-based record index
        row: usize,
        /// Offending key
        key: String,
    },

    /// Row or column index beyond what a worksheet can hold
    #[error("worksheet limit exceeded: {0}")]
    SheetLimit(String),

    /// Workbook writer failure
    #[error("xlsx error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// I/O error creating the output directory
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;
