//! SBF Scanner - Crawl orchestration for the SBF listing.
//!
//! This crate walks the SBF (sale of balance flats) listing one town at a
//! time, turns the page text into flat records and makes sure every town's
//! record count matches what the page advertises before accepting it.
//!
//! # Features
//!
//! - Facet enumeration that treats a missing option as the end of a dropdown
//! - Flat type → block traversal with layered record merging
//! - Per-town count reconciliation with bounded, escalating retries
//! - A town link cache and a faulty link list that survive restarts
//!
//! # Example
//!
//! ```rust,ignore
//! use sbf_browser::BrowserEngine;
//! use sbf_core::AppConfig;
//! use sbf_scanner::Orchestrator;
//!
//! let config = AppConfig::load()?;
//! let engine = BrowserEngine::launch(&config.browser).await?;
//!
//! let report = Orchestrator::new(&engine, &config).run().await?;
//! println!("{} of {} units", report.dataset.len(), report.expected_total);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

#[allow(missing_docs)]
pub mod error;
pub mod facet;
#[allow(missing_docs)]
pub mod ledger;
pub mod orchestrator;
#[allow(missing_docs)]
pub mod parser;
#[allow(missing_docs)]
pub mod reconcile;
pub mod retry;
pub mod walker;

// Re-export commonly used types
pub use error::{Result, ScanError};
pub use facet::{Facet, FacetCursor, FacetKind, FacetOption};
pub use ledger::ProgressLedger;
pub use orchestrator::{CrawlReport, Orchestrator};
pub use parser::{BlockContext, Completion, LeafRecord, TownContext};
pub use reconcile::{GlobalReconciliation, ReconciliationEngine, TownOutcome};
pub use retry::{RetryExhausted, RetryPolicy};
pub use walker::{merge_record, HierarchyWalker};
