use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::ValueEnum;
use rust_xlsxwriter::{Format as CellFormat, Workbook};

use crate::record::{Record, COLUMNS};

const SHEET_NAME: &str = "Listings";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Csv,
    Json,
    Xlsx,
}

impl Format {
    fn extension(self) -> &'static str {
        match self {
            Format::Csv => "csv",
            Format::Json => "json",
            Format::Xlsx => "xlsx",
        }
    }
}

/// `justdial_<term>_<location>[_<yyyymmdd>].<ext>`, spaces replaced with underscores.
pub fn file_name(
    search_term: &str,
    location: &str,
    format: Format,
    date: Option<NaiveDate>,
) -> String {
    let stamp = date
        .map(|d| format!("_{}", d.format("%Y%m%d")))
        .unwrap_or_default();
    format!(
        "justdial_{}_{}{}.{}",
        search_term.trim().replace(' ', "_"),
        location.trim().replace(' ', "_"),
        stamp,
        format.extension()
    )
}

pub fn to_csv(records: &[Record]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(vec![]);
    for r in records {
        writer.serialize(r)?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to finish CSV: {}", e))
}

pub fn to_json(records: &[Record]) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(records)?)
}

/// One sheet, bold header row, one row per record.
pub fn to_xlsx(records: &[Record]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let bold = CellFormat::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, header) in COLUMNS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, &bold)?;
    }
    for (i, r) in records.iter().enumerate() {
        let row = i as u32 + 1;
        for (col, value) in r.values().iter().enumerate() {
            sheet.write_string(row, col as u16, *value)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// Write the records into `dir`, returning the path written.
pub fn write(
    records: &[Record],
    search_term: &str,
    location: &str,
    format: Format,
    dir: &Path,
    date: Option<NaiveDate>,
) -> Result<PathBuf> {
    let bytes = match format {
        Format::Csv => to_csv(records)?,
        Format::Json => to_json(records)?,
        Format::Xlsx => to_xlsx(records)?,
    };
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(file_name(search_term, location, format, date));
    std::fs::write(&path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
