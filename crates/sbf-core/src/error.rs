//! Core error types for the SBF scraper.
//!
//! Configuration problems and record-model violations are reported here;
//! browser, scanning and export failures live in their own crates.

use thiserror::Error;

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to determine config directory path
    #[error("could not determine config directory (platform base directories not available)")]
    NoConfigDir,

    /// Config file not found at an explicitly requested path
    #[error("config file not found at {path}")]
    NotFound {
        /// Path where config was expected
        path: String,
    },

    /// Failed to parse TOML
    #[error("failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config
    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// I/O error reading/writing config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Reason for invalidity
        reason: String,
    },
}

/// Errors raised while building flat records.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// A disjoint merge found a key that is already present
    #[error("duplicate key '{key}' in disjoint merge")]
    DuplicateKey {
        /// Colliding key
        key: String,
    },

    /// A town link is not an absolute http(s) URL
    #[error("invalid town link '{link}': {reason}")]
    InvalidLink {
        /// Offending link text
        link: String,
        /// Reason for rejection
        reason: String,
    },
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for record operations.
pub type RecordResult<T> = std::result::Result<T, RecordError>;
