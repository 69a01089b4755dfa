//! Workbook writer.

use crate::error::{ExportError, Result};
use crate::layout::{sheet_col, sheet_row, Cell, ColumnLayout};
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};
use rust_xlsxwriter::{ExcelDateTime, Format, Formula, Workbook, Worksheet};
use sbf_core::{Dataset, OutputConfig};
use std::fs;
use std::path::{Path, PathBuf};

/// Writes a dataset to a single-sheet `.xlsx` workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabularExporter {
    dir: PathBuf,
    sheet_name: String,
    date_format: String,
}

impl TabularExporter {
    #[must_use]
    pub fn new(output: &OutputConfig) -> Self {
        Self {
            dir: output.dir.clone(),
            sheet_name: output.sheet_name.clone(),
            date_format: output.date_format.clone(),
        }
    }

    /// Workbook path under `dir`: `base` with `.xlsx` appended when missing,
    /// otherwise a timestamped `SBF_Scraped_<YYYYmmdd_HHMMSS>.xlsx`.
    #[must_use]
    pub fn output_path(dir: &Path, base: Option<&str>, now: NaiveDateTime) -> PathBuf {
        let file_name = match base.map(str::trim).filter(|b| !b.is_empty()) {
            Some(base) if base.ends_with(".xlsx") => base.to_string(),
            Some(base) => format!("{base}.xlsx"),
            None => format!("SBF_Scraped_{}.xlsx", now.format("%Y%m%d_%H%M%S")),
        };
        dir.join(file_name)
    }

    /// Export to the output directory, creating it if needed.
    pub fn export(&self, dataset: &Dataset, base: Option<&str>) -> Result<PathBuf> {
        let now = Local::now().naive_local();
        let path = Self::output_path(&self.dir, base, now);

        if !self.dir.as_os_str().is_empty() {
            fs::create_dir_all(&self.dir)?;
        }

        self.export_to(dataset, &path, now.date())?;
        Ok(path)
    }

    /// Write the workbook to `path`. `today` seeds the cached formula results.
    pub fn export_to(&self, dataset: &Dataset, path: &Path, today: NaiveDate) -> Result<()> {
        let layout = ColumnLayout::from_dataset(dataset)?;
        tracing::info!("Writing {} rows to {}", dataset.len(), path.display());

        let mut workbook = Workbook::new();
        let date_format = Format::new().set_num_format(&self.date_format);

        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&self.sheet_name)?;

        for (col, header) in layout.columns().iter().enumerate() {
            worksheet.write_string(0, sheet_col(col)?, header)?;
        }

        for (index, record) in dataset.records().iter().enumerate() {
            let row = sheet_row(index + 1)?;
            for (col, cell) in layout.plan_row(index, record, today)?.into_iter().enumerate() {
                write_cell(worksheet, row, sheet_col(col)?, cell, &date_format)?;
            }
        }

        tracing::debug!("Autofitting {} columns", layout.columns().len());
        worksheet.autofit();

        workbook.save(path)?;
        tracing::info!("Saved workbook {}", path.display());
        Ok(())
    }
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: Cell<'_>,
    date_format: &Format,
) -> Result<()> {
    match cell {
        Cell::Text(text) => {
            worksheet.write_string(row, col, text)?;
        }
        Cell::Number(number) => {
            worksheet.write_number(row, col, number)?;
        }
        Cell::Bool(value) => {
            worksheet.write_boolean(row, col, value)?;
        }
        Cell::Date(date) => {
            let date = excel_date(date)?;
            worksheet.write_datetime_with_format(row, col, &date, date_format)?;
        }
        Cell::EmptyDate => {
            worksheet.write_blank(row, col, date_format)?;
        }
        Cell::Formula { text, cached } => {
            worksheet.write_formula(row, col, Formula::new(text).set_result(cached.to_string()))?;
        }
        Cell::Blank => {}
    }
    Ok(())
}

#[allow(clippy::cast_possible_truncation)]
fn excel_date(date: NaiveDate) -> Result<ExcelDateTime> {
    let year = u16::try_from(date.year()).map_err(|_| {
        ExportError::SheetLimit(format!("year {} outside the workbook date range", date.year()))
    })?;
    // month and day always fit
    Ok(ExcelDateTime::from_ymd(year, date.month() as u8, date.day() as u8)?)
}
