//! Column layout and per-cell write plan.
//!
//! Everything here is independent of the workbook writer so the mapping from
//! record values to cells can be checked without producing a file.

use crate::error::{ExportError, Result};
use chrono::{Datelike, NaiveDate};
use rust_xlsxwriter::utility::row_col_to_cell;
use sbf_core::{keys, CellValue, Dataset, FlatRecord};

/// What to write into one cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell<'a> {
    Text(&'a str),
    Number(f64),
    Bool(bool),
    /// Date cell with the date number format
    Date(NaiveDate),
    /// Blank cell that still carries the date number format
    EmptyDate,
    /// Formula with the value shown by viewers that do not recalculate
    Formula { text: String, cached: i64 },
    Blank,
}

/// Header order taken from the first record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    columns: Vec<String>,
    completion: Option<usize>,
}

impl ColumnLayout {
    /// Layout for a dataset. Fails when there is nothing to lay out.
    pub fn from_dataset(dataset: &Dataset) -> Result<Self> {
        let columns: Vec<String> = dataset
            .columns()
            .ok_or(ExportError::EmptyDataset)?
            .into_iter()
            .map(str::to_string)
            .collect();
        let completion = columns.iter().position(|c| c == keys::COMPLETION_DATE);
        Ok(Self {
            columns,
            completion,
        })
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == key)
    }

    /// Cells for record `index`, which lands on worksheet row `index + 1`.
    ///
    /// Columns the record lacks stay blank.
    pub fn plan_row<'r>(
        &self,
        index: usize,
        record: &'r FlatRecord,
        today: NaiveDate,
    ) -> Result<Vec<Cell<'r>>> {
        let mut cells = vec![Cell::Blank; self.columns.len()];

        for (key, value) in record.iter() {
            let col = self.index_of(key).ok_or_else(|| ExportError::UnknownColumn {
                row: index,
                key: key.to_string(),
            })?;

            cells[col] = match value {
                CellValue::Text(s) => Cell::Text(s),
                #[allow(clippy::cast_precision_loss)]
                CellValue::Integer(n) => Cell::Number(*n as f64),
                CellValue::Bool(b) => Cell::Bool(*b),
                CellValue::Date(Some(d)) => Cell::Date(*d),
                CellValue::Date(None) => Cell::EmptyDate,
                CellValue::MonthsToCompletion => self.months_cell(index, record, today)?,
            };
        }

        Ok(cells)
    }

    fn months_cell(&self, index: usize, record: &FlatRecord, today: NaiveDate) -> Result<Cell<'static>> {
        let Some(col) = self.completion else {
            return Ok(Cell::Blank);
        };

        let completion = match record.get(keys::COMPLETION_DATE) {
            Some(CellValue::Date(date)) => *date,
            _ => None,
        };

        Ok(Cell::Formula {
            text: months_formula(sheet_row(index + 1)?, sheet_col(col)?),
            cached: months_remaining(today, completion),
        })
    }
}

/// Formula giving whole months from today until the date in (`row`, `col`),
/// or 0 when that date is empty or already past.
#[must_use]
pub fn months_formula(row: u32, col: u16) -> String {
    format!(
        "=IFERROR(DATEDIF(TODAY(),{},\"M\"),0)",
        row_col_to_cell(row, col)
    )
}

/// Whole months from `today` until `completion`, matching `DATEDIF(..., "M")`
/// wrapped in `IFERROR(..., 0)`.
#[must_use]
pub fn months_remaining(today: NaiveDate, completion: Option<NaiveDate>) -> i64 {
    let Some(end) = completion else {
        return 0;
    };
    if end < today {
        return 0;
    }

    let mut months = i64::from(end.year() - today.year()) * 12 + i64::from(end.month())
        - i64::from(today.month());
    if end.day() < today.day() {
        months -= 1;
    }
    months
}

pub(crate) fn sheet_row(row: usize) -> Result<u32> {
    u32::try_from(row).map_err(|_| ExportError::SheetLimit(format!("row {row}")))
}

pub(crate) fn sheet_col(col: usize) -> Result<u16> {
    u16::try_from(col).map_err(|_| ExportError::SheetLimit(format!("column {col}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(completion: Option<NaiveDate>) -> FlatRecord {
        let mut record = FlatRecord::new();
        record.set(keys::TOWN, "Tengah");
        record.set(keys::REMAINING_LEASE, 99_i64);
        record.set(keys::COMPLETION_DATE, CellValue::Date(completion));
        record.set(keys::MONTHS_TO_COMPLETION, CellValue::MonthsToCompletion);
        record.set(keys::KEYS_AVAILABLE, completion.is_none());
        record
    }

    fn dataset(records: Vec<FlatRecord>) -> Dataset {
        let mut dataset = Dataset::new();
        dataset.extend(records);
        dataset
    }

    #[test]
    fn test_months_remaining() {
        let today = date(2026, 10, 16);
        assert_eq!(months_remaining(today, None), 0);
        assert_eq!(months_remaining(today, Some(date(2026, 1, 1))), 0);
        assert_eq!(months_remaining(today, Some(date(2026, 11, 1))), 0);
        assert_eq!(months_remaining(today, Some(date(2026, 11, 16))), 1);
        assert_eq!(months_remaining(today, Some(date(2027, 12, 1))), 13);
    }

    #[test]
    fn test_months_formula_text() {
        assert_eq!(months_formula(1, 2), "=IFERROR(DATEDIF(TODAY(),C2,\"M\"),0)");
        assert_eq!(months_formula(41, 27), "=IFERROR(DATEDIF(TODAY(),AB42,\"M\"),0)");
    }

    #[test]
    fn test_empty_dataset_rejected() {
        let err = ColumnLayout::from_dataset(&Dataset::new()).unwrap_err();
        assert!(matches!(err, ExportError::EmptyDataset));
    }

    #[test]
    fn test_plan_row_types() {
        let today = date(2026, 10, 16);
        let data = dataset(vec![record(Some(date(2027, 12, 1)))]);
        let layout = ColumnLayout::from_dataset(&data).unwrap();

        let cells = layout.plan_row(0, &data.records()[0], today).unwrap();
        assert_eq!(
            cells,
            vec![
                Cell::Text("Tengah"),
                Cell::Number(99.0),
                Cell::Date(date(2027, 12, 1)),
                Cell::Formula {
                    text: "=IFERROR(DATEDIF(TODAY(),C2,\"M\"),0)".to_string(),
                    cached: 13,
                },
                Cell::Bool(false),
            ]
        );
    }

    #[test]
    fn test_keys_available_row() {
        let today = date(2026, 10, 16);
        let data = dataset(vec![record(Some(date(2027, 12, 1))), record(None)]);
        let layout = ColumnLayout::from_dataset(&data).unwrap();

        let cells = layout.plan_row(1, &data.records()[1], today).unwrap();
        assert_eq!(cells[2], Cell::EmptyDate);
        assert_eq!(
            cells[3],
            Cell::Formula {
                text: "=IFERROR(DATEDIF(TODAY(),C3,\"M\"),0)".to_string(),
                cached: 0,
            }
        );
        assert_eq!(cells[4], Cell::Bool(true));
    }

    #[test]
    fn test_missing_column_is_blank() {
        let today = date(2026, 10, 16);
        let mut short = FlatRecord::new();
        short.set(keys::TOWN, "Bedok");
        let data = dataset(vec![record(None), short]);
        let layout = ColumnLayout::from_dataset(&data).unwrap();

        let cells = layout.plan_row(1, &data.records()[1], today).unwrap();
        assert_eq!(cells[0], Cell::Text("Bedok"));
        assert!(cells[1..].iter().all(|c| *c == Cell::Blank));
    }

    #[test]
    fn test_unknown_column_rejected() {
        let today = date(2026, 10, 16);
        let mut extra = record(None);
        extra.set("Chinese", "Available");
        let data = dataset(vec![record(None), extra]);
        let layout = ColumnLayout::from_dataset(&data).unwrap();

        let err = layout.plan_row(1, &data.records()[1], today).unwrap_err();
        assert!(matches!(err, ExportError::UnknownColumn { row: 1, ref key } if key == "Chinese"));
    }
}
