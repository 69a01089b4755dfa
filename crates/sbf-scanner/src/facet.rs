//! Facet enumeration over dropdown controls.
//!
//! A facet's options are discovered by selecting index 0, 1, 2, ... until the
//! page reports that the option does not exist. That "not found" is the end of
//! the sequence, never an error.

use crate::error::Result;
use sbf_browser::BrowserActions;
use sbf_core::{FacetConfig, Locator, SelectorConfig};
use std::fmt;
use std::time::Duration;

/// Which dropdown a facet is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacetKind {
    /// Flat type (2-room flexi, 3-room, ...)
    FlatType,
    /// Block within the selected flat type
    Block,
}

impl fmt::Display for FacetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FlatType => write!(f, "flat type"),
            Self::Block => write!(f, "block"),
        }
    }
}

/// A facet control and the position of its first real option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Facet {
    /// Facet kind
    pub kind: FacetKind,
    /// The `<select>` control
    pub control: Locator,
    /// 1-based position of option 0 (placeholder options come first)
    pub header_offset: usize,
}

impl Facet {
    /// Flat-type facet from configuration.
    #[must_use]
    pub fn flat_type(selectors: &SelectorConfig, facets: &FacetConfig) -> Self {
        Self {
            kind: FacetKind::FlatType,
            control: selectors.flat_type_select.clone(),
            header_offset: facets.flat_type_offset,
        }
    }

    /// Block facet from configuration.
    #[must_use]
    pub fn block(selectors: &SelectorConfig, facets: &FacetConfig) -> Self {
        Self {
            kind: FacetKind::Block,
            control: selectors.block_select.clone(),
            header_offset: facets.block_offset,
        }
    }

    /// Locator of the label element for option `index`.
    #[must_use]
    pub fn option_locator(&self, index: usize) -> Locator {
        self.control.nth_option(index + self.header_offset)
    }
}

/// One selected option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetOption {
    /// 0-based option index
    pub index: usize,
    /// Display label
    pub label: String,
}

/// Walks the options of one facet, selecting each in turn.
///
/// Once the end of the facet is reached the cursor stays exhausted.
pub struct FacetCursor<'a, S: ?Sized> {
    session: &'a S,
    facet: &'a Facet,
    next_index: usize,
    exhausted: bool,
    settle: Duration,
}

impl<'a, S: BrowserActions + ?Sized> FacetCursor<'a, S> {
    /// Start at option 0. `settle` is slept after each selection.
    pub fn new(session: &'a S, facet: &'a Facet, settle: Duration) -> Self {
        Self {
            session,
            facet,
            next_index: 0,
            exhausted: false,
            settle,
        }
    }

    /// Whether the end of the facet has been reached.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Select the next option and return it, or `None` at the end of the facet.
    ///
    /// Errors other than a missing option/label propagate unchanged.
    pub async fn next_option(&mut self) -> Result<Option<FacetOption>> {
        if self.exhausted {
            return Ok(None);
        }

        let index = self.next_index;
        match self
            .session
            .select_by_value(&self.facet.control, &index.to_string())
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_not_found() => return Ok(self.finish(index)),
            Err(e) => return Err(e.into()),
        }

        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }

        let label = match self
            .session
            .extract_text(&self.facet.option_locator(index))
            .await
        {
            Ok(label) => label,
            Err(e) if e.is_not_found() => return Ok(self.finish(index)),
            Err(e) => return Err(e.into()),
        };

        self.next_index += 1;
        Ok(Some(FacetOption {
            index,
            label: label.trim().to_string(),
        }))
    }

    /// Drain the facet, selecting every option in order.
    pub async fn collect_all(mut self) -> Result<Vec<FacetOption>> {
        let mut options = Vec::new();
        while let Some(option) = self.next_option().await? {
            options.push(option);
        }
        Ok(options)
    }

    fn finish(&mut self, count: usize) -> Option<FacetOption> {
        self.exhausted = true;
        tracing::debug!(facet = %self.facet.kind, options = count, "Facet exhausted");
        None
    }
}
