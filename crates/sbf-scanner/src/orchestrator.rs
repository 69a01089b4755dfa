//! Crawl orchestrator for a full SBF run.
//!
//! This module provides the `Orchestrator` which opens the SBF category,
//! acquires the town list (from the ledger or by paging through the listing),
//! runs every town through the [`ReconciliationEngine`] and reports the
//! dataset-wide count.

use crate::error::{Result, ScanError};
use crate::ledger::ProgressLedger;
use crate::parser;
use crate::reconcile::{settle, GlobalReconciliation, ReconciliationEngine, TownOutcome};
use crate::retry::RetryPolicy;
use sbf_browser::{BrowserActions, BrowserError};
use sbf_core::{AppConfig, Dataset, TownLink};
use std::collections::HashSet;
use std::time::{Duration, Instant};

/// Result of a full crawl.
#[derive(Debug)]
pub struct CrawlReport {
    /// Records from every accepted town
    pub dataset: Dataset,
    /// Total advertised on the category card
    pub expected_total: usize,
    /// Towns attempted
    pub towns: usize,
    /// Towns that exhausted their attempts
    pub faulty_links: Vec<TownLink>,
    /// Wall time of the crawl
    pub elapsed: Duration,
}

impl CrawlReport {
    /// Dataset-wide count check.
    #[must_use]
    pub fn reconciliation(&self) -> GlobalReconciliation {
        GlobalReconciliation {
            expected: self.expected_total,
            observed: self.dataset.len(),
        }
    }
}

/// Drives one crawl over a single browser session.
pub struct Orchestrator<'a, S: ?Sized> {
    /// Browser session shared by every stage
    session: &'a S,
    config: &'a AppConfig,
    ledger: ProgressLedger,
    policy: RetryPolicy,
}

impl<'a, S: BrowserActions + ?Sized> Orchestrator<'a, S> {
    /// Create an orchestrator with ledger paths and retry policy from config.
    #[must_use]
    pub fn new(session: &'a S, config: &'a AppConfig) -> Self {
        Self {
            session,
            config,
            ledger: ProgressLedger::from_config(&config.output),
            policy: RetryPolicy::from_config(&config.crawl),
        }
    }

    /// Use a different ledger.
    #[must_use]
    pub fn with_ledger(mut self, ledger: ProgressLedger) -> Self {
        self.ledger = ledger;
        self
    }

    /// Use a different per-town retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Run the crawl.
    ///
    /// Failures inside a town are retried and then recorded as faulty links.
    /// Anything failing outside a town (landing page, category card, town
    /// list, ledger files) aborts the run.
    pub async fn run(&self) -> Result<CrawlReport> {
        let started = Instant::now();

        let expected_total = self.open_category().await?;
        let links = self.town_links().await?;

        let engine = ReconciliationEngine::new(self.session, self.config).with_policy(self.policy);
        let mut dataset = Dataset::new();
        let mut faulty_links = Vec::new();

        for (position, link) in links.iter().enumerate() {
            tracing::info!("Town {}/{}: {}", position + 1, links.len(), link);
            match engine.process_town(link).await {
                TownOutcome::Accepted { records, .. } => dataset.extend(records),
                TownOutcome::Faulty { link, .. } => faulty_links.push(link),
            }
        }

        let elapsed = started.elapsed();
        tracing::info!(
            "{} flats found. Took {:.2} seconds",
            dataset.len(),
            elapsed.as_secs_f64()
        );

        let report = CrawlReport {
            dataset,
            expected_total,
            towns: links.len(),
            faulty_links,
            elapsed,
        };
        report.reconciliation().report();

        if report.faulty_links.is_empty() {
            self.ledger.clear_faulty()?;
        } else {
            self.ledger.write_faulty(&report.faulty_links)?;
        }

        Ok(report)
    }

    /// Open the configured category card and return the unit total it shows.
    async fn open_category(&self) -> Result<usize> {
        let crawl = &self.config.crawl;
        let cards = &self.config.selectors.category_cards;

        self.session.navigate(&crawl.landing_url).await?;
        self.session
            .wait_for_selector(cards, self.config.browser.element_timeout_ms())
            .await?;
        settle(crawl.settle_delay()).await;

        let texts = self.session.extract_all_text(cards).await?;
        let index = texts
            .iter()
            .position(|text| text.lines().next().map(str::trim) == Some(crawl.category_label.as_str()))
            .ok_or_else(|| ScanError::CategoryNotFound {
                label: crawl.category_label.clone(),
            })?;
        let expected = parser::parse_category_count(&texts[index])?;

        self.session.click_nth(cards, index).await?;
        settle(crawl.settle_delay()).await;

        tracing::info!("{} units listed under {}", expected, crawl.category_label);
        Ok(expected)
    }

    /// Town links from the ledger, discovering and saving them on first run.
    async fn town_links(&self) -> Result<Vec<TownLink>> {
        if let Some(links) = self.ledger.load_towns()? {
            return Ok(links);
        }

        let links = self.discover_town_links().await?;
        self.ledger.save_towns(&links)?;
        Ok(links)
    }

    /// Page through the category listing collecting every town link.
    async fn discover_town_links(&self) -> Result<Vec<TownLink>> {
        let crawl = &self.config.crawl;
        let selectors = &self.config.selectors;
        let timeout_ms = self.config.browser.element_timeout_ms();

        self.session
            .wait_for_selector(&selectors.page_size_select, timeout_ms)
            .await?;
        self.session
            .select_by_value(&selectors.page_size_select, &crawl.page_size)
            .await?;
        settle(crawl.settle_delay()).await;

        let mut links = Vec::new();
        let mut seen = HashSet::new();
        let mut page = 1;

        loop {
            self.session
                .wait_for_selector(&selectors.town_links, timeout_ms)
                .await?;
            let hrefs = self
                .session
                .extract_attributes(&selectors.town_links, "href")
                .await?;

            let before = links.len();
            for href in hrefs {
                match TownLink::parse(&href) {
                    Ok(link) => {
                        if seen.insert(link.clone()) {
                            links.push(link);
                        }
                    }
                    Err(e) => tracing::warn!("Skipping town link on page {}: {}", page, e),
                }
            }
            tracing::debug!(page, new_links = links.len() - before, "Listing page read");

            // A pager that does not advance would otherwise loop forever
            if links.len() == before {
                tracing::warn!("Listing page {} had no new town links, stopping", page);
                break;
            }

            match self.session.click(&selectors.next_button).await {
                Ok(()) => {
                    page += 1;
                    settle(crawl.settle_delay()).await;
                }
                Err(BrowserError::NotClickable(_)) => break,
                Err(e) => return Err(e.into()),
            }
        }

        tracing::info!("Discovered {} town links over {} pages", links.len(), page);
        Ok(links)
    }
}
