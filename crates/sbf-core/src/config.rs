//! Configuration management for the SBF scraper.
//!
//! Provides TOML-based configuration with platform-specific paths and
//! environment variable overrides. Every table falls back to defaults, so a
//! partial file only needs the values it changes.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Locator;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application configuration.
///
/// This is loaded from `~/.config/sbf-scraper/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Browser session settings
    pub browser: BrowserConfig,
    /// Crawl pacing and retry settings
    pub crawl: CrawlConfig,
    /// Facet option header offsets
    pub facets: FacetConfig,
    /// Page element locators
    pub selectors: SelectorConfig,
    /// Output files
    pub output: OutputConfig,
}

impl AppConfig {
    /// Load configuration from the platform config path, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config = Self::read_platform()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from an explicit file, which must exist.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let config = Self::read_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `SBF_HEADLESS`: Override browser headless mode (true/false)
    /// - `SBF_OUTPUT_DIR`: Override the output directory
    /// - `SBF_MAX_ATTEMPTS`: Override per-town attempt limit
    pub fn load_with_env(path: Option<&Path>) -> ConfigResult<Self> {
        // Validate the merged result only
        let mut config = match path {
            Some(path) => Self::read_file(path)?,
            None => Self::read_platform()?,
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn read_platform() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::read_file(&config_path)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    fn read_file(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            });
        }

        tracing::debug!("Loading config from {}", path.display());
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Apply `SBF_*` environment overrides in place.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("SBF_HEADLESS") {
            if let Ok(headless) = val.parse() {
                self.browser.headless = headless;
                tracing::debug!("Override browser.headless from env: {}", headless);
            }
        }

        if let Ok(val) = std::env::var("SBF_OUTPUT_DIR") {
            if !val.trim().is_empty() {
                tracing::debug!("Override output.dir from env: {}", val);
                self.output.dir = PathBuf::from(val);
            }
        }

        if let Ok(val) = std::env::var("SBF_MAX_ATTEMPTS") {
            if let Ok(attempts) = val.parse() {
                self.crawl.max_attempts = attempts;
                tracing::debug!("Override crawl.max_attempts from env: {}", attempts);
            }
        }
    }

    /// Reject values the crawl cannot run with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.crawl.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "crawl.max_attempts".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.facets.flat_type_offset == 0 || self.facets.block_offset == 0 {
            return Err(ConfigError::InvalidValue {
                field: "facets".to_string(),
                reason: "option offsets are 1-based positions and must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Save configuration to the platform config path.
    pub fn save(&self) -> ConfigResult<PathBuf> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    /// Save configuration to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }

        tracing::debug!("Saving config to {}", path.display());
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("com", "sbf-scraper", "sbf-scraper")
            .ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// Browser session settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run browser in headless mode
    pub headless: bool,
    /// Browser window width
    pub window_width: u32,
    /// Browser window height
    pub window_height: u32,
    /// Navigation timeout in seconds
    pub navigation_timeout_secs: u64,
    /// How long to wait for an element to appear, in seconds
    pub element_timeout_secs: u64,
}

impl BrowserConfig {
    /// Element wait timeout in milliseconds.
    #[must_use]
    pub fn element_timeout_ms(&self) -> u64 {
        self.element_timeout_secs * 1000
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: false,
            window_width: 1920,
            window_height: 1080,
            navigation_timeout_secs: 30,
            element_timeout_secs: 10,
        }
    }
}

/// Crawl pacing and retry settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Listing page the crawl starts from
    pub landing_url: String,
    /// First line of the category card to open
    pub category_label: String,
    /// Page-size option selected before collecting town links
    pub page_size: String,
    /// Pause after navigations and pager clicks, in milliseconds
    pub settle_delay_ms: u64,
    /// Pause after each facet selection, in milliseconds
    pub selection_settle_ms: u64,
    /// Attempts per town before it is recorded as faulty
    pub max_attempts: u32,
    /// Backoff unit in seconds; attempt `n` waits `n * unit` after failing
    pub backoff_unit_secs: u64,
}

impl CrawlConfig {
    /// Settle delay as a duration.
    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Selection settle delay as a duration.
    #[must_use]
    pub fn selection_settle(&self) -> Duration {
        Duration::from_millis(self.selection_settle_ms)
    }

    /// Backoff unit as a duration.
    #[must_use]
    pub fn backoff_unit(&self) -> Duration {
        Duration::from_secs(self.backoff_unit_secs)
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            landing_url: "https://homes.hdb.gov.sg/home/finding-a-flat".to_string(),
            category_label: "SBF".to_string(),
            page_size: "50".to_string(),
            settle_delay_ms: 1000,
            selection_settle_ms: 300,
            max_attempts: 5,
            backoff_unit_secs: 10,
        }
    }
}

/// 1-based XPath position of option 0 in each facet control.
///
/// Each control carries a leading placeholder option, so option `i` sits at
/// position `i + offset`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacetConfig {
    /// Flat-type selector offset
    pub flat_type_offset: usize,
    /// Block selector offset
    pub block_offset: usize,
}

impl Default for FacetConfig {
    fn default() -> Self {
        Self {
            flat_type_offset: 2,
            block_offset: 2,
        }
    }
}

/// Page element locators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Category cards on the landing page
    pub category_cards: Locator,
    /// Listing page-size dropdown
    pub page_size_select: Locator,
    /// Town page anchors in the listing
    pub town_links: Locator,
    /// Listing pager "next" control
    pub next_button: Locator,
    /// Town detail key/value panel
    pub town_details: Locator,
    /// Town total-units table
    pub total_units: Locator,
    /// Flat-type dropdown
    pub flat_type_select: Locator,
    /// Block dropdown
    pub block_select: Locator,
    /// Ethnic quota panel for the selected block
    pub ethnic_quota: Locator,
    /// Unit availability grid for the selected block
    pub unit_grid: Locator,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            category_cards: Locator::xpath(
                "/html/body/app-root/div[2]/app-find-my-flat/section/div/\
                 app-search-results/div/div/div[4]/app-flat-cards-categories",
            ),
            page_size_select: Locator::xpath(
                "/html/body/app-root/div[2]/app-find-my-flat/section/div/\
                 app-search-results/div/div/div[3]/div/div[1]/div[1]/div[2]/select",
            ),
            town_links: Locator::css(".flat-link"),
            next_button: Locator::css("[aria-label=Next]"),
            town_details: Locator::xpath(
                "/html/body/app-root/div[2]/app-sbf-details/section/div/div[3]/div[1]/\
                 div/div/div/div[2]/div",
            ),
            total_units: Locator::xpath(
                "/html/body/app-root/div[2]/app-sbf-details/section/div/div[3]/div[1]/\
                 div/div/div/div[3]/table",
            ),
            flat_type_select: Locator::xpath("//*[@id='layout-block']/div[2]/div/div/div[1]/select"),
            block_select: Locator::xpath("//*[@id='layout-block']/div[2]/div/div/div[3]/select"),
            ethnic_quota: Locator::xpath("//*[@id='available-sidebar']/div[1]/div[2]"),
            unit_grid: Locator::xpath("//*[@id='available-grid']"),
        }
    }
}

/// Output files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory the workbook is written to
    pub dir: PathBuf,
    /// Cached town link list
    pub town_links_file: PathBuf,
    /// Links of towns that exhausted their attempts
    pub faulty_links_file: PathBuf,
    /// Worksheet name
    pub sheet_name: String,
    /// Number format for date cells
    pub date_format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("outputs"),
            town_links_file: PathBuf::from("towns.txt"),
            faulty_links_file: PathBuf::from("faulty_links.txt"),
            sheet_name: "Raw Data".to_string(),
            date_format: "mm/dd/yyyy".to_string(),
        }
    }
}
