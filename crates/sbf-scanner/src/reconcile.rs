//! Unit-count reconciliation at town and dataset scope.
//!
//! A town's records are only accepted when their count matches the total the
//! town page advertises. Any failure, including a mismatch, re-runs the whole
//! town from navigation onward under the [`RetryPolicy`].

use crate::error::{Result, ScanError};
use crate::parser;
use crate::retry::RetryPolicy;
use crate::walker::HierarchyWalker;
use sbf_browser::BrowserActions;
use sbf_core::{keys, AppConfig, FlatRecord, TownLink};

/// What became of one town.
#[derive(Debug)]
pub enum TownOutcome {
    /// Counts matched; records carry the `Link` column.
    Accepted {
        link: TownLink,
        records: Vec<FlatRecord>,
        attempts: u32,
    },
    /// Every attempt failed; the town contributes nothing.
    Faulty {
        link: TownLink,
        attempts: u32,
        error: String,
    },
}

impl TownOutcome {
    #[must_use]
    pub fn link(&self) -> &TownLink {
        match self {
            Self::Accepted { link, .. } | Self::Faulty { link, .. } => link,
        }
    }

    #[must_use]
    pub fn is_faulty(&self) -> bool {
        matches!(self, Self::Faulty { .. })
    }
}

/// Scrapes single towns with count validation and retry.
pub struct ReconciliationEngine<'a, S: ?Sized> {
    session: &'a S,
    config: &'a AppConfig,
    walker: HierarchyWalker<'a, S>,
    policy: RetryPolicy,
}

impl<'a, S: BrowserActions + ?Sized> ReconciliationEngine<'a, S> {
    /// Create an engine using the retry policy from `[crawl]`.
    pub fn new(session: &'a S, config: &'a AppConfig) -> Self {
        Self {
            session,
            config,
            walker: HierarchyWalker::new(session, config),
            policy: RetryPolicy::from_config(&config.crawl),
        }
    }

    /// Override the retry policy.
    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Scrape one town, retrying until its count reconciles or attempts run out.
    ///
    /// Never fails: exhaustion is reported as [`TownOutcome::Faulty`].
    pub async fn process_town(&self, link: &TownLink) -> TownOutcome {
        let attempts = std::cell::Cell::new(0);
        let result = self
            .policy
            .run_if(link.as_str(), ScanError::is_retryable, |attempt| {
                attempts.set(attempt + 1);
                self.attempt_town(link)
            })
            .await;

        match result {
            Ok(records) => {
                tracing::info!("{} units scraped from {}", records.len(), link);
                TownOutcome::Accepted {
                    link: link.clone(),
                    records,
                    attempts: attempts.get(),
                }
            }
            Err(exhausted) => {
                tracing::error!(
                    "Giving up on {} after {} attempts: {}",
                    link,
                    exhausted.attempts,
                    exhausted.last_error
                );
                TownOutcome::Faulty {
                    link: link.clone(),
                    attempts: exhausted.attempts,
                    error: exhausted.last_error.to_string(),
                }
            }
        }
    }

    /// One full pass over a town page. Partial records are dropped on error.
    async fn attempt_town(&self, link: &TownLink) -> Result<Vec<FlatRecord>> {
        let selectors = &self.config.selectors;

        self.session.navigate(link.as_str()).await?;
        self.session
            .wait_for_selector(
                &selectors.town_details,
                self.config.browser.element_timeout_ms(),
            )
            .await?;
        settle(self.config.crawl.settle_delay()).await;

        let details = self.session.extract_text(&selectors.town_details).await?;
        let town = parser::parse_town(&details, link)?;

        let mut records = self.walker.walk(&town).await?;

        let total_text = self.session.extract_text(&selectors.total_units).await?;
        let expected = parser::parse_unit_count(&total_text)?;
        if records.len() != expected {
            return Err(ScanError::CountMismatch {
                link: link.to_string(),
                expected,
                observed: records.len(),
            });
        }

        for record in &mut records {
            record.append([(keys::LINK, link.as_str())])?;
        }
        Ok(records)
    }
}

/// Dataset-wide count check against the category card total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalReconciliation {
    /// Total advertised on the category card
    pub expected: usize,
    /// Records collected
    pub observed: usize,
}

impl GlobalReconciliation {
    /// Units not collected. Negative when more were collected than advertised.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn missing(&self) -> i64 {
        self.expected as i64 - self.observed as i64
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.expected == self.observed
    }

    /// Log the outcome. A mismatch never blocks export.
    pub fn report(&self) {
        if self.is_complete() {
            tracing::info!("Scraped correct number of units ({})", self.observed);
        } else {
            tracing::warn!(
                "Scraped {} of {} units, {} missing",
                self.observed,
                self.expected,
                self.missing()
            );
        }
    }
}

pub(crate) async fn settle(delay: std::time::Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
