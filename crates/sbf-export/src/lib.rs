//! SBF Export - Spreadsheet output for scraped flat records.
//!
//! Writes a [`Dataset`](sbf_core::Dataset) to a single-sheet `.xlsx`
//! workbook. Column order comes from the first record; completion dates get
//! a date number format and the months-to-completion column is a live
//! formula over the completion date cell of the same row.
//!
//! # Example
//!
//! ```rust,ignore
//! use sbf_export::TabularExporter;
//!
//! let exporter = TabularExporter::new(&config.output);
//! let path = exporter.export(&report.dataset, Some("march"))?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod error;
#[allow(missing_docs)]
pub mod exporter;
#[allow(missing_docs)]
pub mod layout;

pub use error::{ExportError, Result};
pub use exporter::TabularExporter;
pub use layout::{months_formula, months_remaining, Cell, ColumnLayout};
