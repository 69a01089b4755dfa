//! Shared types used across the SBF scraper.
//!
//! The record model is an ordered key/value row: contexts gathered at each
//! level of the town → flat type → block → unit walk are layered into one
//! [`FlatRecord`] per unit, and the first record's key order becomes the
//! export column order.

use crate::error::{RecordError, RecordResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Column keys the scraper itself introduces.
///
/// Town attribute keys otherwise come straight from the town page.
pub mod keys {
    /// Remaining lease, parsed to an integer
    pub const REMAINING_LEASE: &str = "Remaining Lease";
    /// Probable completion date, parsed to a first-of-month date
    pub const COMPLETION_DATE: &str = "Probable Completion Date";
    /// Placeholder later written as a months-until-completion formula
    pub const MONTHS_TO_COMPLETION: &str = "Est months";
    /// Whether keys are already available for the project
    pub const KEYS_AVAILABLE: &str = "Keys Available";
    /// Town name attribute, when the page carries one
    pub const TOWN: &str = "Town";
    /// Selected flat type label
    pub const FLAT_TYPE: &str = "flat_type";
    /// Selected block label
    pub const BLOCK: &str = "Block";
    /// Floor level
    pub const LEVEL: &str = "level";
    /// Unit label
    pub const UNIT: &str = "unit";
    /// Floor area in square metres
    pub const SQM: &str = "sqm";
    /// Price
    pub const PRICE: &str = "price";
    /// Source town page
    pub const LINK: &str = "Link";
}

/// A typed cell value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellValue {
    /// Free text
    Text(String),
    /// Whole number
    Integer(i64),
    /// Flag
    Bool(bool),
    /// Calendar date; `None` when there is no date (keys already available)
    Date(Option<NaiveDate>),
    /// Placeholder for the months-until-completion column, computed at export
    MonthsToCompletion,
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Date(Some(d)) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Date(None) | Self::MonthsToCompletion => Ok(()),
        }
    }
}

/// An ordered row of key/value pairs.
///
/// Keys keep the position of their first insertion. [`FlatRecord::overlay`]
/// replaces values on collision (later layer wins); [`FlatRecord::append`]
/// rejects collisions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatRecord {
    entries: Vec<(String, CellValue)>,
}

impl FlatRecord {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the record has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Whether the key is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Set a single key, replacing any existing value in place.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<CellValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Layer another set of entries over this record; later values win.
    pub fn overlay<I, K, V>(&mut self, layer: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<CellValue>,
    {
        for (key, value) in layer {
            self.set(key, value);
        }
    }

    /// Append entries whose keys must not already be present.
    ///
    /// Nothing is inserted when any key collides.
    pub fn append<I, K, V>(&mut self, layer: I) -> RecordResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<CellValue>,
    {
        let layer: Vec<(String, CellValue)> = layer
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        for (i, (key, _)) in layer.iter().enumerate() {
            if self.contains_key(key) || layer[..i].iter().any(|(k, _)| k == key) {
                return Err(RecordError::DuplicateKey { key: key.clone() });
            }
        }

        self.entries.extend(layer);
        Ok(())
    }
}

impl IntoIterator for FlatRecord {
    type Item = (String, CellValue);
    type IntoIter = std::vec::IntoIter<(String, CellValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Append-only list of records across all towns.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<FlatRecord>,
}

impl Dataset {
    /// Create an empty dataset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one town's accepted records.
    pub fn extend(&mut self, records: impl IntoIterator<Item = FlatRecord>) {
        self.records.extend(records);
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no records were collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records, in collection order.
    #[must_use]
    pub fn records(&self) -> &[FlatRecord] {
        &self.records
    }

    /// Column order: the key order of the first record.
    #[must_use]
    pub fn columns(&self) -> Option<Vec<&str>> {
        self.records.first().map(|r| r.keys().collect())
    }
}

/// Newtype for town page links.
///
/// Links must be absolute `http` or `https` URLs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TownLink(String);

impl TownLink {
    /// Validate and wrap a link. Surrounding whitespace is trimmed.
    ///
    /// # Errors
    /// Returns error if the link is not an absolute http(s) URL.
    pub fn parse(link: &str) -> RecordResult<Self> {
        let trimmed = link.trim();
        let url = url::Url::parse(trimmed).map_err(|e| RecordError::InvalidLink {
            link: trimmed.to_string(),
            reason: e.to_string(),
        })?;

        match url.scheme() {
            "http" | "https" => Ok(Self(trimmed.to_string())),
            other => Err(RecordError::InvalidLink {
                link: trimmed.to_string(),
                reason: format!("unsupported scheme '{other}'"),
            }),
        }
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TownLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Locates page elements, either by XPath or by CSS selector.
///
/// In TOML: `town_details = { xpath = "//div[2]" }` or `next_button = { css = ".next" }`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locator {
    /// XPath expression
    Xpath(String),
    /// CSS selector
    Css(String),
}

impl Locator {
    /// XPath locator.
    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::Xpath(expr.into())
    }

    /// CSS locator.
    pub fn css(expr: impl Into<String>) -> Self {
        Self::Css(expr.into())
    }

    /// Locator for the `<option>` at 1-based `position` under this control.
    #[must_use]
    pub fn nth_option(&self, position: usize) -> Self {
        match self {
            Self::Xpath(expr) => Self::Xpath(format!("{expr}/option[{position}]")),
            Self::Css(expr) => Self::Css(format!("{expr} > option:nth-of-type({position})")),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Xpath(expr) => write!(f, "xpath:{expr}"),
            Self::Css(expr) => write!(f, "css:{expr}"),
        }
    }
}
