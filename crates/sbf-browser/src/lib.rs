//! Browser automation for select-driven listing sites.
//!
//! Exposes a narrow page session ([`BrowserActions`]) that the scanner drives,
//! and a Chrome DevTools implementation of it ([`BrowserEngine`]).

pub mod actions;
pub mod engine;
pub mod error;

pub use actions::BrowserActions;
pub use engine::BrowserEngine;
pub use error::{BrowserError, Result};
pub use sbf_core::Locator;
