use crate::error::{Result, ScanError};
use chrono::NaiveDate;
use regex::Regex;
use sbf_core::{keys, CellValue, FlatRecord, TownLink};
use std::sync::OnceLock;

/// Per-town attributes read from the town detail panel.
#[derive(Debug, Clone, PartialEq)]
pub struct TownContext {
    pub name: Option<String>,
    pub link: TownLink,
    pub remaining_lease: u32,
    pub keys_available: bool,
    pub completion_date: Option<NaiveDate>,
    attributes: FlatRecord,
}

impl TownContext {
    /// All town columns in page order, with lease and completion already typed.
    #[must_use]
    pub fn attributes(&self) -> &FlatRecord {
        &self.attributes
    }
}

/// Block label plus its ethnic quota, valid for one (flat type, block) selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockContext {
    pub label: String,
    pub ethnic_quota: Vec<(String, String)>,
}

impl BlockContext {
    /// Context columns for this block: the label followed by each quota category.
    #[must_use]
    pub fn layer(&self) -> Vec<(String, CellValue)> {
        std::iter::once((keys::BLOCK.to_string(), CellValue::from(self.label.as_str())))
            .chain(
                self.ethnic_quota
                    .iter()
                    .map(|(k, v)| (k.clone(), CellValue::from(v.as_str()))),
            )
            .collect()
    }
}

/// One housing unit from a block's availability grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafRecord {
    pub level: i64,
    pub unit: String,
    pub sqm: i64,
    pub price: i64,
}

impl LeafRecord {
    #[must_use]
    pub fn layer(&self) -> [(&'static str, CellValue); 4] {
        [
            (keys::LEVEL, CellValue::Integer(self.level)),
            (keys::UNIT, CellValue::from(self.unit.as_str())),
            (keys::SQM, CellValue::Integer(self.sqm)),
            (keys::PRICE, CellValue::Integer(self.price)),
        ]
    }
}

/// How a project's completion is stated on the town page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    KeysAvailable,
    Expected(NaiveDate),
}

/// Zip alternating key/value parts into pairs. A trailing unpaired key is dropped.
fn zip_pairs<'a>(parts: impl Iterator<Item = &'a str>) -> Vec<(String, String)> {
    let parts: Vec<&str> = parts.map(str::trim).collect();
    parts
        .chunks_exact(2)
        .map(|pair| (pair[0].to_string(), pair[1].to_string()))
        .collect()
}

/// Parse the town detail panel text.
pub fn parse_town(raw_text: &str, link: &TownLink) -> Result<TownContext> {
    let pairs = zip_pairs(raw_text.lines());

    let lease_text = pairs
        .iter()
        .find(|(k, _)| k == keys::REMAINING_LEASE)
        .map(|(_, v)| v.as_str())
        .ok_or_else(|| ScanError::parse(keys::REMAINING_LEASE, "missing from town details"))?;
    let remaining_lease = parse_lease(lease_text)?;

    let completion_text = pairs
        .iter()
        .find(|(k, _)| k == keys::COMPLETION_DATE)
        .map(|(_, v)| v.as_str())
        .ok_or_else(|| ScanError::parse(keys::COMPLETION_DATE, "missing from town details"))?;
    let completion = parse_completion(completion_text)?;
    let completion_date = match completion {
        Completion::KeysAvailable => None,
        Completion::Expected(date) => Some(date),
    };

    let name = pairs
        .iter()
        .find(|(k, _)| k == keys::TOWN)
        .map(|(_, v)| v.clone());

    let mut attributes = FlatRecord::new();
    for (key, value) in pairs {
        let cell = match key.as_str() {
            keys::REMAINING_LEASE => CellValue::Integer(i64::from(remaining_lease)),
            keys::COMPLETION_DATE => CellValue::Date(completion_date),
            _ => CellValue::Text(value),
        };
        attributes.set(key, cell);
    }
    attributes.set(keys::MONTHS_TO_COMPLETION, CellValue::MonthsToCompletion);
    attributes.set(
        keys::KEYS_AVAILABLE,
        completion == Completion::KeysAvailable,
    );

    Ok(TownContext {
        name,
        link: link.clone(),
        remaining_lease,
        keys_available: completion == Completion::KeysAvailable,
        completion_date,
        attributes,
    })
}

/// Remaining lease: the last run of digits, so a range "A - B" yields B.
pub fn parse_lease(lease: &str) -> Result<u32> {
    static DIGITS: OnceLock<Regex> = OnceLock::new();
    let digits = DIGITS.get_or_init(|| Regex::new(r"\d+").expect("valid regex"));

    let last = digits
        .find_iter(lease)
        .last()
        .ok_or_else(|| ScanError::parse(keys::REMAINING_LEASE, format!("no digits in '{lease}'")))?;

    last.as_str()
        .parse()
        .map_err(|e| ScanError::parse(keys::REMAINING_LEASE, format!("'{lease}': {e}")))
}

/// Completion status. "available" anywhere (any case) means keys are ready and
/// no date is parsed.
pub fn parse_completion(text: &str) -> Result<Completion> {
    if text.to_lowercase().contains("available") {
        Ok(Completion::KeysAvailable)
    } else {
        parse_date(text).map(Completion::Expected)
    }
}

/// First day of the stated month.
///
/// Accepts `Q<n>/<year>` or `Q<n> to <year>` (month `n * 3`) and
/// `<m>/<year>` or `<m> to <year>`. The last occurrence wins.
pub fn parse_date(text: &str) -> Result<NaiveDate> {
    static QUARTER: OnceLock<Regex> = OnceLock::new();
    static MONTH: OnceLock<Regex> = OnceLock::new();
    let quarter = QUARTER.get_or_init(|| {
        Regex::new(r"(?i)\bq\s*(\d)\s*(?:/|\bto\b)\s*(\d{4})\b").expect("valid regex")
    });
    let month = MONTH.get_or_init(|| {
        Regex::new(r"(?i)\b(\d{1,2})\s*(?:/|\bto\b)\s*(\d{4})\b").expect("valid regex")
    });

    let (month_number, year) = if let Some(caps) = quarter.captures_iter(text).last() {
        let q: u32 = caps[1]
            .parse()
            .map_err(|e| ScanError::parse(keys::COMPLETION_DATE, format!("'{text}': {e}")))?;
        if !(1..=4).contains(&q) {
            return Err(ScanError::parse(
                keys::COMPLETION_DATE,
                format!("quarter {q} out of range in '{text}'"),
            ));
        }
        (q * 3, caps[2].to_string())
    } else if let Some(caps) = month.captures_iter(text).last() {
        let m: u32 = caps[1]
            .parse()
            .map_err(|e| ScanError::parse(keys::COMPLETION_DATE, format!("'{text}': {e}")))?;
        (m, caps[2].to_string())
    } else {
        return Err(ScanError::parse(
            keys::COMPLETION_DATE,
            format!("unrecognised date '{text}'"),
        ));
    };

    let year: i32 = year
        .parse()
        .map_err(|e| ScanError::parse(keys::COMPLETION_DATE, format!("'{text}': {e}")))?;

    NaiveDate::from_ymd_opt(year, month_number, 1).ok_or_else(|| {
        ScanError::parse(
            keys::COMPLETION_DATE,
            format!("month {month_number} out of range in '{text}'"),
        )
    })
}

/// Parse a block's unit grid: `#`-delimited floor segments, each a level line
/// followed by (unit, area, price) triples. Blank lines are ignored.
pub fn parse_block_grid(raw_text: &str) -> Result<Vec<LeafRecord>> {
    let mut leaves = Vec::new();
    for segment in raw_text.split('#').filter(|s| !s.trim().is_empty()) {
        leaves.extend(parse_floor(segment)?);
    }
    Ok(leaves)
}

/// Parse one floor segment.
pub fn parse_floor(segment: &str) -> Result<Vec<LeafRecord>> {
    let lines: Vec<&str> = segment
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let Some((level_line, units)) = lines.split_first() else {
        return Ok(Vec::new());
    };

    let level: i64 = level_line
        .parse()
        .map_err(|e| ScanError::parse(keys::LEVEL, format!("'{level_line}': {e}")))?;

    if units.len() % 3 != 0 {
        return Err(ScanError::parse(
            keys::UNIT,
            format!(
                "floor {level} has {} unit lines, expected groups of three",
                units.len()
            ),
        ));
    }

    units
        .chunks_exact(3)
        .map(|triple| -> Result<LeafRecord> {
            let area_text = triple[1];
            let sqm = area_text
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .parse()
                .map_err(|e| ScanError::parse(keys::SQM, format!("'{area_text}': {e}")))?;

            let price_text = triple[2];
            let price = price_text
                .replace(['$', ','], "")
                .trim()
                .parse()
                .map_err(|e| ScanError::parse(keys::PRICE, format!("'{price_text}': {e}")))?;

            Ok(LeafRecord {
                level,
                unit: triple[0].to_string(),
                sqm,
                price,
            })
        })
        .collect()
}

/// Ethnic quota panel: alternating category/quota split on newlines or colons.
#[must_use]
pub fn parse_ethnic_quota(raw_text: &str) -> Vec<(String, String)> {
    zip_pairs(raw_text.split(['\n', ':']))
}

/// A town's authoritative unit count: the last whitespace token of the
/// total-units text.
pub fn parse_unit_count(text: &str) -> Result<usize> {
    let token = text
        .split_whitespace()
        .last()
        .ok_or_else(|| ScanError::parse("total units", "empty text"))?;
    let digits: String = token.chars().filter(char::is_ascii_digit).collect();
    digits
        .parse()
        .map_err(|e| ScanError::parse("total units", format!("'{token}': {e}")))
}

/// Unit count on a category card: every digit of its second line.
pub fn parse_category_count(card_text: &str) -> Result<usize> {
    let line = card_text
        .lines()
        .nth(1)
        .ok_or_else(|| ScanError::parse("category count", format!("no count line in '{card_text}'")))?;
    let digits: String = line.chars().filter(char::is_ascii_digit).collect();
    digits
        .parse()
        .map_err(|e| ScanError::parse("category count", format!("'{line}': {e}")))
}
