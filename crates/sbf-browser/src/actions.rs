use crate::error::{BrowserError, Result};
use sbf_core::Locator;

/// Page session primitives the scanner is allowed to use.
///
/// One session drives one page; every selection mutates page state that later
/// reads depend on, so callers must not interleave work from different towns.
#[async_trait::async_trait]
pub trait BrowserActions: Send + Sync {
    /// Navigate to a URL and wait for the load to finish
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Wait for a locator to match at least one element
    async fn wait_for_selector(&self, locator: &Locator, timeout_ms: u64) -> Result<()>;

    /// Visible text of the first matching element
    async fn extract_text(&self, locator: &Locator) -> Result<String>;

    /// Visible text of every matching element, in document order
    async fn extract_all_text(&self, locator: &Locator) -> Result<Vec<String>>;

    /// Attribute values of every matching element that carries the attribute
    async fn extract_attributes(&self, locator: &Locator, name: &str) -> Result<Vec<String>>;

    /// Select the option whose `value` equals `value` in a `<select>` control.
    ///
    /// Fails with [`BrowserError::ElementNotFound`] when the control or the
    /// option does not exist.
    async fn select_by_value(&self, locator: &Locator, value: &str) -> Result<()>;

    /// Click the first matching element.
    ///
    /// Fails with [`BrowserError::NotClickable`] when the element is disabled.
    async fn click(&self, locator: &Locator) -> Result<()> {
        self.click_nth(locator, 0).await
    }

    /// Click the `index`-th matching element (0-based)
    async fn click_nth(&self, locator: &Locator, index: usize) -> Result<()>;
}

/// Check that a URL is absolute and has a host before navigating to it.
pub fn validate_url(url: &str) -> Result<String> {
    let url = url::Url::parse(url)
        .map_err(|e| BrowserError::NavigationError(format!("Invalid URL: {}", e)))?;

    url.host_str()
        .ok_or_else(|| BrowserError::NavigationError("No host in URL".to_string()))
        .map(|s| s.to_string())
}
