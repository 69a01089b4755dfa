#![allow(dead_code)]

use sbf_browser::{BrowserActions, BrowserError, Locator, Result};
use sbf_core::{AppConfig, SelectorConfig};
use std::collections::HashMap;
use std::sync::Mutex;

pub const LANDING: &str = "https://sbf.test/home/finding-a-flat";

/// Config with every delay zeroed.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.crawl.landing_url = LANDING.to_string();
    config.crawl.settle_delay_ms = 0;
    config.crawl.selection_settle_ms = 0;
    config.crawl.backoff_unit_secs = 0;
    config
}

pub fn town_link(slug: &str) -> String {
    format!("https://sbf.test/home/sbf/{slug}")
}

pub struct FakeBlock {
    pub label: String,
    pub quota: String,
    pub grid: String,
}

impl FakeBlock {
    /// Block with one floor holding `units` units.
    pub fn with_units(label: &str, level: u32, units: usize) -> Self {
        let mut grid = format!("#\n{level}\n");
        for n in 0..units {
            grid.push_str(&format!("A{n}\n\n65 sqm\n$350,000\n"));
        }
        Self {
            label: label.to_string(),
            quota: "Chinese: Available\nMalay: Available\nIndian/Other Races: Available".to_string(),
            grid,
        }
    }
}

pub struct FakeFlatType {
    pub label: String,
    pub blocks: Vec<FakeBlock>,
}

pub struct FakeTown {
    pub link: String,
    pub details: String,
    pub total_units: String,
    pub flat_types: Vec<FakeFlatType>,
    /// Attempts (1-based) up to and including this one fail on flat-type selection
    pub failing_attempts: usize,
}

impl FakeTown {
    pub fn new(slug: &str, name: &str, expected: usize, flat_types: Vec<FakeFlatType>) -> Self {
        Self {
            link: town_link(slug),
            details: format!(
                "Town\n{name}\nRemaining Lease\n95 - 99\nProbable Completion Date\nQ4/2027\nEthnic Quota\nApplies"
            ),
            total_units: format!("Total units {expected}"),
            flat_types,
            failing_attempts: 0,
        }
    }

    pub fn failing(mut self, attempts: usize) -> Self {
        self.failing_attempts = attempts;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Page {
    Blank,
    Landing,
    Town(usize),
}

struct State {
    page: Page,
    listing_page: usize,
    page_size: Option<String>,
    opened_card: Option<usize>,
    flat_type: Option<usize>,
    block: Option<usize>,
    navigations: HashMap<String, usize>,
}

/// In-memory stand-in for the SBF site: a landing page with category cards,
/// a paged town listing, and town pages with flat-type/block dropdowns.
pub struct FakeSite {
    selectors: SelectorConfig,
    pub cards: Vec<String>,
    pub listing: Vec<Vec<String>>,
    pub towns: Vec<FakeTown>,
    state: Mutex<State>,
}

impl FakeSite {
    pub fn new(cards: &[&str], listing: Vec<Vec<String>>, towns: Vec<FakeTown>) -> Self {
        Self {
            selectors: SelectorConfig::default(),
            cards: cards.iter().map(|c| (*c).to_string()).collect(),
            listing,
            towns,
            state: Mutex::new(State {
                page: Page::Blank,
                listing_page: 0,
                page_size: None,
                opened_card: None,
                flat_type: None,
                block: None,
                navigations: HashMap::new(),
            }),
        }
    }

    pub fn navigations(&self, url: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .navigations
            .get(url)
            .copied()
            .unwrap_or(0)
    }

    pub fn opened_card(&self) -> Option<usize> {
        self.state.lock().unwrap().opened_card
    }

    pub fn page_size(&self) -> Option<String> {
        self.state.lock().unwrap().page_size.clone()
    }

    fn not_found(locator: &Locator) -> BrowserError {
        BrowserError::ElementNotFound(locator.to_string())
    }

    fn town(&self, state: &State) -> Option<&FakeTown> {
        match state.page {
            Page::Town(i) => self.towns.get(i),
            _ => None,
        }
    }

    fn current_block<'s>(&'s self, state: &State) -> Option<&'s FakeBlock> {
        let flat_type = self.town(state)?.flat_types.get(state.flat_type?)?;
        flat_type.blocks.get(state.block?)
    }

    /// Index `i` whose option locator (placeholder offset 2) equals `locator`.
    fn option_index(control: &Locator, locator: &Locator, count: usize) -> Option<usize> {
        (0..count).find(|i| control.nth_option(i + 2) == *locator)
    }

    fn text(&self, state: &State, locator: &Locator) -> Result<String> {
        let s = &self.selectors;
        if state.page == Page::Landing {
            if *locator == s.category_cards {
                return self.cards.first().cloned().ok_or_else(|| Self::not_found(locator));
            }
            return Err(Self::not_found(locator));
        }

        let town = self.town(state).ok_or_else(|| Self::not_found(locator))?;
        if *locator == s.town_details {
            return Ok(town.details.clone());
        }
        if *locator == s.total_units {
            return Ok(town.total_units.clone());
        }
        if *locator == s.ethnic_quota {
            return self
                .current_block(state)
                .map(|b| b.quota.clone())
                .ok_or_else(|| Self::not_found(locator));
        }
        if *locator == s.unit_grid {
            return self
                .current_block(state)
                .map(|b| b.grid.clone())
                .ok_or_else(|| Self::not_found(locator));
        }
        if let Some(i) = Self::option_index(&s.flat_type_select, locator, town.flat_types.len()) {
            return Ok(town.flat_types[i].label.clone());
        }
        if let Some(flat_type) = state.flat_type.and_then(|i| town.flat_types.get(i)) {
            if let Some(i) = Self::option_index(&s.block_select, locator, flat_type.blocks.len()) {
                return Ok(flat_type.blocks[i].label.clone());
            }
        }
        Err(Self::not_found(locator))
    }
}

#[async_trait::async_trait]
impl BrowserActions for FakeSite {
    async fn navigate(&self, url: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        *state.navigations.entry(url.to_string()).or_insert(0) += 1;

        let page = if url == LANDING {
            Page::Landing
        } else if let Some(i) = self.towns.iter().position(|t| t.link == url) {
            Page::Town(i)
        } else {
            return Err(BrowserError::NavigationError(format!("{url}: 404")));
        };
        state.page = page;
        state.listing_page = 0;
        state.flat_type = None;
        state.block = None;
        Ok(())
    }

    async fn wait_for_selector(&self, locator: &Locator, _timeout_ms: u64) -> Result<()> {
        let state = self.state.lock().unwrap();
        let s = &self.selectors;
        let present = match state.page {
            Page::Landing => {
                *locator == s.category_cards
                    || *locator == s.page_size_select
                    || *locator == s.next_button
                    || (*locator == s.town_links && !self.listing.is_empty())
            }
            Page::Town(_) => *locator == s.town_details || *locator == s.total_units,
            Page::Blank => false,
        };
        if present {
            Ok(())
        } else {
            Err(BrowserError::Timeout(format!("{locator} not present")))
        }
    }

    async fn extract_text(&self, locator: &Locator) -> Result<String> {
        let state = self.state.lock().unwrap();
        self.text(&state, locator)
    }

    async fn extract_all_text(&self, locator: &Locator) -> Result<Vec<String>> {
        let state = self.state.lock().unwrap();
        if state.page == Page::Landing && *locator == self.selectors.category_cards {
            return Ok(self.cards.clone());
        }
        Ok(Vec::new())
    }

    async fn extract_attributes(&self, locator: &Locator, name: &str) -> Result<Vec<String>> {
        let state = self.state.lock().unwrap();
        if state.page == Page::Landing && *locator == self.selectors.town_links && name == "href" {
            return Ok(self.listing.get(state.listing_page).cloned().unwrap_or_default());
        }
        Ok(Vec::new())
    }

    async fn select_by_value(&self, locator: &Locator, value: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let s = &self.selectors;

        if state.page == Page::Landing && *locator == s.page_size_select {
            state.page_size = Some(value.to_string());
            return Ok(());
        }

        let Page::Town(town_index) = state.page else {
            return Err(Self::not_found(locator));
        };
        let town = &self.towns[town_index];
        let index: usize = value
            .parse()
            .map_err(|_| BrowserError::ElementNotFound(format!("option {value}")))?;

        if *locator == s.flat_type_select {
            let attempt = state.navigations.get(&town.link).copied().unwrap_or(0);
            if attempt <= town.failing_attempts {
                return Err(BrowserError::Timeout(format!("{locator} unresponsive")));
            }
            if index >= town.flat_types.len() {
                return Err(BrowserError::ElementNotFound(format!("option {value}")));
            }
            state.flat_type = Some(index);
            state.block = None;
            return Ok(());
        }

        if *locator == s.block_select {
            let blocks = state
                .flat_type
                .and_then(|i| town.flat_types.get(i))
                .map_or(0, |f| f.blocks.len());
            if index >= blocks {
                return Err(BrowserError::ElementNotFound(format!("option {value}")));
            }
            state.block = Some(index);
            return Ok(());
        }

        Err(Self::not_found(locator))
    }

    async fn click_nth(&self, locator: &Locator, index: usize) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.page != Page::Landing {
            return Err(Self::not_found(locator));
        }

        if *locator == self.selectors.category_cards {
            if index >= self.cards.len() {
                return Err(Self::not_found(locator));
            }
            state.opened_card = Some(index);
            return Ok(());
        }

        if *locator == self.selectors.next_button {
            if state.listing_page + 1 < self.listing.len() {
                state.listing_page += 1;
                return Ok(());
            }
            return Err(BrowserError::NotClickable(locator.to_string()));
        }

        Err(Self::not_found(locator))
    }
}
