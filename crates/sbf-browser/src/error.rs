use thiserror::Error;

pub type Result<T> = std::result::Result<T, BrowserError>;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("chromium error: {0}")]
    ChromiumError(String),

    #[error("navigation failed: {0}")]
    NavigationError(String),

    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("element not clickable: {0}")]
    NotClickable(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("page script failed: {0}")]
    ScriptError(String),
}

impl BrowserError {
    /// Whether the error means the located element (or option) does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ElementNotFound(_))
    }
}
