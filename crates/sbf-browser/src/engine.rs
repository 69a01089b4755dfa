use crate::actions::{validate_url, BrowserActions};
use crate::error::{BrowserError, Result};
use chromiumoxide::browser::{Browser, BrowserConfig as ChromeConfig};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures_util::stream::StreamExt;
use sbf_core::{BrowserConfig, Locator};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Poll interval while waiting for an element to appear.
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Reply shape shared by every page script.
#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum ScriptOutcome<T> {
    Ok { value: T },
    Missing,
    Disabled,
}

/// Browser automation engine: one Chromium instance driving one page.
pub struct BrowserEngine {
    browser: Mutex<Browser>,
    page: Page,
    handler: JoinHandle<()>,
    navigation_timeout: Duration,
}

impl BrowserEngine {
    /// Launch Chromium with the given settings and open a blank page.
    pub async fn launch(config: &BrowserConfig) -> Result<Self> {
        let mut builder = ChromeConfig::builder()
            .no_sandbox()
            .window_size(config.window_width, config.window_height);
        if !config.headless {
            builder = builder.with_head();
        }
        let chrome_config = builder.build().map_err(BrowserError::ChromiumError)?;

        let (browser, mut handler) = Browser::launch(chrome_config)
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;

        // Spawn browser handler
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;

        tracing::info!(headless = config.headless, "Browser session started");

        Ok(Self {
            browser: Mutex::new(browser),
            page,
            handler,
            navigation_timeout: Duration::from_secs(config.navigation_timeout_secs),
        })
    }

    /// Close the browser and wait for the process and its event handler to exit.
    pub async fn shutdown(self) -> Result<()> {
        let mut browser = self.browser.into_inner();
        browser
            .close()
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;
        if let Err(e) = browser.wait().await {
            tracing::warn!("Browser process did not exit cleanly: {}", e);
        }
        if let Err(e) = self.handler.await {
            tracing::warn!("Browser event handler ended abnormally: {}", e);
        }
        tracing::info!("Browser session closed");
        Ok(())
    }

    async fn run_script<T: DeserializeOwned>(&self, script: &str, locator: &Locator) -> Result<T> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| BrowserError::ScriptError(format!("{locator}: {e}")))?;

        let outcome: ScriptOutcome<T> = result
            .into_value()
            .map_err(|e| BrowserError::ScriptError(format!("{locator}: {e}")))?;

        match outcome {
            ScriptOutcome::Ok { value } => Ok(value),
            ScriptOutcome::Missing => Err(BrowserError::ElementNotFound(locator.to_string())),
            ScriptOutcome::Disabled => Err(BrowserError::NotClickable(locator.to_string())),
        }
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<Element>> {
        let found = match locator {
            Locator::Xpath(expr) => self.page.find_xpaths(expr.as_str()).await,
            Locator::Css(expr) => self.page.find_elements(expr.as_str()).await,
        };
        found.map_err(|_| BrowserError::ElementNotFound(locator.to_string()))
    }
}

#[async_trait::async_trait]
impl BrowserActions for BrowserEngine {
    async fn navigate(&self, url: &str) -> Result<()> {
        validate_url(url)?;

        match tokio::time::timeout(self.navigation_timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => {
                self.page
                    .wait_for_navigation()
                    .await
                    .map_err(|e| BrowserError::NavigationError(format!("{url}: {e}")))?;
                tracing::debug!(url, "Navigated");
                Ok(())
            }
            Ok(Err(e)) => Err(BrowserError::NavigationError(format!("{url}: {e}"))),
            Err(_) => Err(BrowserError::Timeout(format!(
                "navigation to {url} after {:?}",
                self.navigation_timeout
            ))),
        }
    }

    async fn wait_for_selector(&self, locator: &Locator, timeout_ms: u64) -> Result<()> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        let script = count_script(locator);

        loop {
            let count: usize = self.run_script(&script, locator).await?;
            if count > 0 {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::Timeout(format!(
                    "{locator} not present after {timeout_ms}ms"
                )));
            }
            tokio::time::sleep(WAIT_POLL_INTERVAL).await;
        }
    }

    async fn extract_text(&self, locator: &Locator) -> Result<String> {
        self.run_script(&first_text_script(locator), locator).await
    }

    async fn extract_all_text(&self, locator: &Locator) -> Result<Vec<String>> {
        self.run_script(&all_text_script(locator), locator).await
    }

    async fn extract_attributes(&self, locator: &Locator, name: &str) -> Result<Vec<String>> {
        self.run_script(&attributes_script(locator, name), locator)
            .await
    }

    async fn select_by_value(&self, locator: &Locator, value: &str) -> Result<()> {
        self.run_script::<()>(&select_script(locator, value), locator)
            .await
    }

    async fn click_nth(&self, locator: &Locator, index: usize) -> Result<()> {
        // Disabled pager controls stay in the DOM, so check state before clicking
        self.run_script::<()>(&clickable_script(locator, index), locator)
            .await?;

        let element = self
            .find_all(locator)
            .await?
            .into_iter()
            .nth(index)
            .ok_or_else(|| BrowserError::ElementNotFound(format!("{locator}[{index}]")))?;

        element
            .click()
            .await
            .map_err(|e| BrowserError::NotClickable(format!("{locator}[{index}]: {e}")))?;
        Ok(())
    }
}

/// Quote a Rust string as a JavaScript string literal.
fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

/// Expression evaluating to an array of the locator's matches.
fn nodes_expr(locator: &Locator) -> String {
    match locator {
        Locator::Xpath(expr) => format!(
            "(() => {{ const r = document.evaluate({}, document, null, \
             XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); const out = []; \
             for (let i = 0; i < r.snapshotLength; i++) out.push(r.snapshotItem(i)); \
             return out; }})()",
            js_string(expr)
        ),
        Locator::Css(expr) => format!(
            "Array.from(document.querySelectorAll({}))",
            js_string(expr)
        ),
    }
}

fn wrap(locator: &Locator, body: &str) -> String {
    format!(
        "(() => {{ const nodes = {}; {} }})()",
        nodes_expr(locator),
        body
    )
}

fn count_script(locator: &Locator) -> String {
    wrap(locator, "return { status: \"ok\", value: nodes.length };")
}

fn first_text_script(locator: &Locator) -> String {
    wrap(
        locator,
        "if (nodes.length === 0) return { status: \"missing\" }; \
         const n = nodes[0]; \
         return { status: \"ok\", value: (n.innerText ?? n.textContent ?? \"\").trim() };",
    )
}

fn all_text_script(locator: &Locator) -> String {
    wrap(
        locator,
        "return { status: \"ok\", value: nodes.map(n => (n.innerText ?? n.textContent ?? \"\").trim()) };",
    )
}

fn attributes_script(locator: &Locator, name: &str) -> String {
    // Prefer the resolved DOM property (absolute href) over the raw attribute
    wrap(
        locator,
        &format!(
            "const name = {}; \
             const values = nodes.map(n => (typeof n[name] === \"string\" && n[name] !== \"\") \
             ? n[name] : n.getAttribute(name)).filter(v => v !== null); \
             return {{ status: \"ok\", value: values }};",
            js_string(name)
        ),
    )
}

fn select_script(locator: &Locator, value: &str) -> String {
    wrap(
        locator,
        &format!(
            "if (nodes.length === 0) return {{ status: \"missing\" }}; \
             const control = nodes[0]; const value = {}; \
             const option = Array.from(control.options || []).find(o => o.value === value); \
             if (!option) return {{ status: \"missing\" }}; \
             control.value = value; \
             control.dispatchEvent(new Event(\"change\", {{ bubbles: true }})); \
             return {{ status: \"ok\", value: null }};",
            js_string(value)
        ),
    )
}

fn clickable_script(locator: &Locator, index: usize) -> String {
    wrap(
        locator,
        &format!(
            "if (nodes.length <= {index}) return {{ status: \"missing\" }}; \
             const el = nodes[{index}]; \
             const item = el.closest ? (el.closest(\"li\") || el) : el; \
             const disabled = el.disabled === true \
               || el.getAttribute(\"aria-disabled\") === \"true\" \
               || el.classList.contains(\"disabled\") \
               || item.classList.contains(\"disabled\"); \
             if (disabled) return {{ status: \"disabled\" }}; \
             return {{ status: \"ok\", value: null }};"
        ),
    )
}
