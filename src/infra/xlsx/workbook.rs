use std::path::Path;

use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook_auto, Data, ExcelDateTime, Reader};
use chrono::{DurationRound, TimeDelta};
use umya_spreadsheet::{reader, writer, Spreadsheet, Worksheet};

use crate::domain::entities::record::{HEADERS, TIMESTAMP_FORMAT};

/// Sheet names other tools leave behind in a fresh workbook.
const DEFAULT_SHEET_NAMES: [&str; 2] = ["Sheet", "Sheet1"];

pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(v) => v.to_string(),
        Data::Float(v) => v.to_string(),
        Data::Int(v) => v.to_string(),
        Data::Bool(v) => v.to_string(),
        Data::DateTime(v) => date_time_to_string(v),
        Data::DateTimeIso(v) => v.to_string(),
        Data::DurationIso(v) => v.to_string(),
        Data::Error(v) => format!("{v:?}"),
        Data::Empty => String::new(),
    }
}

/// Date cells written by other tools come back in the timestamp layout; the serial
/// number is kept only when it is not a calendar date.
fn date_time_to_string(value: &ExcelDateTime) -> String {
    if value.is_duration() {
        return value.to_string();
    }
    match value.as_datetime() {
        Some(date_time) => date_time
            .duration_round(TimeDelta::seconds(1))
            .unwrap_or(date_time)
            .format(TIMESTAMP_FORMAT)
            .to_string(),
        None => value.to_string(),
    }
}

pub fn header_matches(sheet: &Worksheet) -> bool {
    HEADERS
        .iter()
        .enumerate()
        .all(|(idx, name)| sheet.get_value((idx as u32 + 1, 1)) == *name)
}

pub fn write_header(sheet: &mut Worksheet) {
    for (idx, name) in HEADERS.iter().enumerate() {
        sheet
            .get_cell_mut((idx as u32 + 1, 1))
            .set_value_string(*name);
    }
}

/// Writes `cells` into row `row`, always as text so codes keep their leading zeros.
pub fn write_row(sheet: &mut Worksheet, row: u32, cells: &[&str]) {
    for (idx, value) in cells.iter().enumerate() {
        sheet
            .get_cell_mut((idx as u32 + 1, row))
            .set_value_string(*value);
    }
}

pub fn save_workbook(book: &Spreadsheet, path: &Path) -> Result<()> {
    writer::xlsx::write(book, path)
        .with_context(|| format!("failed to write workbook: {}", path.display()))
}

fn create_workbook(path: &Path, sheet_name: &str) -> Result<Spreadsheet> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create parent dir: {}", parent.display()))?;
    }

    let mut book = umya_spreadsheet::new_file_empty_worksheet();
    let sheet = book
        .new_sheet(sheet_name)
        .map_err(|err| anyhow!("failed to create sheet {sheet_name}: {err}"))?;
    write_header(sheet);
    save_workbook(&book, path)?;
    tracing::info!(path = %path.display(), sheet = sheet_name, "created workbook");
    Ok(book)
}

/// Opens the workbook, creating the file, the sheet or the header row when they
/// are missing. Only writes back when something had to be repaired.
pub fn ensure_workbook(path: &Path, sheet_name: &str) -> Result<Spreadsheet> {
    if !path.exists() {
        return create_workbook(path, sheet_name);
    }

    let mut book = reader::xlsx::read(path)
        .with_context(|| format!("failed to read workbook: {}", path.display()))?;
    let mut repaired = false;

    if book.get_sheet_by_name(sheet_name).is_none() {
        book.new_sheet(sheet_name)
            .map_err(|err| anyhow!("failed to create sheet {sheet_name}: {err}"))?;
        repaired = true;

        for default_name in DEFAULT_SHEET_NAMES {
            let is_empty_default = default_name != sheet_name
                && book
                    .get_sheet_by_name(default_name)
                    .is_some_and(|sheet| sheet.get_highest_row() == 0);
            if is_empty_default {
                book.remove_sheet_by_name(default_name)
                    .map_err(|err| anyhow!("failed to remove sheet {default_name}: {err}"))?;
            }
        }
    }

    let sheet = sheet_mut(&mut book, sheet_name)?;
    if !header_matches(sheet) {
        write_header(sheet);
        repaired = true;
    }

    if repaired {
        save_workbook(&book, path)?;
        tracing::warn!(path = %path.display(), sheet = sheet_name, "repaired workbook header");
    }
    Ok(book)
}

pub fn sheet_mut<'a>(book: &'a mut Spreadsheet, sheet_name: &str) -> Result<&'a mut Worksheet> {
    book.get_sheet_by_name_mut(sheet_name)
        .ok_or_else(|| anyhow!("sheet not found: {sheet_name}"))
}

/// Reads every row of the sheet as text, header included; index 0 is row 1.
/// Only the header columns are read.
pub fn read_rows(path: &Path, sheet_name: &str) -> Result<Vec<Vec<String>>> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("failed to open xlsx: {}", path.display()))?;
    let range = workbook
        .worksheet_range(sheet_name)
        .with_context(|| format!("failed to read sheet: {sheet_name}"))?;

    let Some((last_row, _)) = range.end() else {
        return Ok(Vec::new());
    };

    let rows = (0..=last_row)
        .map(|row| {
            (0..HEADERS.len() as u32)
                .map(|col| {
                    range
                        .get_value((row, col))
                        .map(cell_to_string)
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect();
    Ok(rows)
}
