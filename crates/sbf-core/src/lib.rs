//! SBF Core - Foundation crate for the SBF scraper.
//!
//! This crate provides the record model, error types and configuration
//! that the browser, scanner and export crates share.
//!
//! # Modules
//!
//! - [`error`] - Configuration and record errors using thiserror
//! - [`config`] - TOML-based configuration with platform paths and env overrides
//! - [`types`] - Typed cells, ordered flat records, town links and page locators
//!
//! # Example
//!
//! ```rust
//! use sbf_core::{CellValue, FlatRecord};
//!
//! let mut record = FlatRecord::new();
//! record.overlay([("Town", CellValue::from("Tengah"))]);
//! record.overlay([("Town", CellValue::from("Bidadari"))]);
//! assert_eq!(record.get("Town"), Some(&CellValue::from("Bidadari")));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{
    AppConfig, BrowserConfig, CrawlConfig, FacetConfig, OutputConfig, SelectorConfig,
};
pub use error::{ConfigError, ConfigResult, RecordError, RecordResult};
pub use types::{keys, CellValue, Dataset, FlatRecord, Locator, TownLink};
