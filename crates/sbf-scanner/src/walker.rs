//! Flat type → block traversal for one town page.

use crate::error::Result;
use crate::facet::{Facet, FacetCursor};
use crate::parser::{self, BlockContext, LeafRecord, TownContext};
use sbf_browser::BrowserActions;
use sbf_core::{keys, AppConfig, FlatRecord, SelectorConfig};
use std::time::Duration;

/// Walks every (flat type, block) pair of the current town page and emits one
/// record per unit.
pub struct HierarchyWalker<'a, S: ?Sized> {
    session: &'a S,
    flat_types: Facet,
    blocks: Facet,
    selectors: &'a SelectorConfig,
    selection_settle: Duration,
}

impl<'a, S: BrowserActions + ?Sized> HierarchyWalker<'a, S> {
    /// Create a walker bound to a browser session.
    pub fn new(session: &'a S, config: &'a AppConfig) -> Self {
        Self {
            session,
            flat_types: Facet::flat_type(&config.selectors, &config.facets),
            blocks: Facet::block(&config.selectors, &config.facets),
            selectors: &config.selectors,
            selection_settle: config.crawl.selection_settle(),
        }
    }

    /// Enumerate all flat types and, for each, all blocks of the page the
    /// session currently shows.
    ///
    /// The block facet is re-enumerated from index 0 after every flat-type
    /// selection since the page repopulates it.
    pub async fn walk(&self, town: &TownContext) -> Result<Vec<FlatRecord>> {
        let mut records = Vec::new();
        let mut flat_types = FacetCursor::new(self.session, &self.flat_types, self.selection_settle);

        while let Some(flat_type) = flat_types.next_option().await? {
            let mut blocks = FacetCursor::new(self.session, &self.blocks, self.selection_settle);
            let mut units_in_type = 0;

            while let Some(block) = blocks.next_option().await? {
                let quota_text = self.session.extract_text(&self.selectors.ethnic_quota).await?;
                let grid_text = self.session.extract_text(&self.selectors.unit_grid).await?;

                let block = BlockContext {
                    label: block.label,
                    ethnic_quota: parser::parse_ethnic_quota(&quota_text),
                };

                for leaf in parser::parse_block_grid(&grid_text)? {
                    records.push(merge_record(town, &flat_type.label, &block, &leaf)?);
                    units_in_type += 1;
                }
            }

            tracing::debug!(
                town = %town.link,
                flat_type = %flat_type.label,
                units = units_in_type,
                "Flat type walked"
            );
        }

        Ok(records)
    }
}

/// Build one output row: town ⊕ flat type ⊕ block layered, then the unit
/// fields appended.
pub fn merge_record(
    town: &TownContext,
    flat_type: &str,
    block: &BlockContext,
    leaf: &LeafRecord,
) -> Result<FlatRecord> {
    let mut record = town.attributes().clone();
    record.overlay([(keys::FLAT_TYPE, flat_type)]);
    record.overlay(block.layer());
    record.append(leaf.layer())?;
    Ok(record)
}
