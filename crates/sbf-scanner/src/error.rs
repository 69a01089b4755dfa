use sbf_browser::BrowserError;
use sbf_core::RecordError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    #[error("Failed to parse {field}: {reason}")]
    Parse { field: String, reason: String },

    #[error("Unit count mismatch for {link}: expected {expected}, found {observed}")]
    CountMismatch {
        link: String,
        expected: usize,
        observed: usize,
    },

    #[error("Record error: {0}")]
    Record(#[from] RecordError),

    #[error("Category card '{label}' not found on landing page")]
    CategoryNotFound { label: String },

    #[error("Ledger I/O error: {0}")]
    Ledger(#[from] std::io::Error),
}

impl ScanError {
    /// Whether another attempt at the same page can succeed.
    ///
    /// Record merge conflicts come from the page structure itself and repeat
    /// on every attempt.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Record(_))
    }

    pub(crate) fn parse(field: &str, reason: impl Into<String>) -> Self {
        Self::Parse {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
