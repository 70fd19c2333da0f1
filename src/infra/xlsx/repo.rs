use std::path::PathBuf;

use crate::domain::entities::record::{Position, Record, StoredRecord};
use crate::infra::xlsx::workbook::{ensure_workbook, read_rows, save_workbook, sheet_mut, write_row};
use crate::usecase::ports::repo::{RecordRepository, StoreError};

/// Records stored one per row in a single sheet of an xlsx workbook.
pub struct XlsxRecordRepo {
    pub workbook_path: PathBuf,
    pub sheet_name: String,
}

impl XlsxRecordRepo {
    pub fn new(workbook_path: impl Into<PathBuf>, sheet_name: impl Into<String>) -> Self {
        Self {
            workbook_path: workbook_path.into(),
            sheet_name: sheet_name.into(),
        }
    }

    fn check_bounds(position: Position, max_row: u32) -> Result<(), StoreError> {
        if position < Position::FIRST_RECORD || position.0 > max_row {
            return Err(StoreError::InvalidPosition(position));
        }
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<Vec<String>>, StoreError> {
        ensure_workbook(&self.workbook_path, &self.sheet_name).map_err(StoreError::persistence)?;
        read_rows(&self.workbook_path, &self.sheet_name).map_err(StoreError::persistence)
    }

    /// Loads the workbook, lets `mutate` change the sheet and saves it back.
    fn modify<F>(&self, mutate: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut umya_spreadsheet::Worksheet) -> Result<(), StoreError>,
    {
        let mut book = ensure_workbook(&self.workbook_path, &self.sheet_name)
            .map_err(StoreError::persistence)?;
        let sheet = sheet_mut(&mut book, &self.sheet_name).map_err(StoreError::persistence)?;
        mutate(sheet)?;
        save_workbook(&book, &self.workbook_path).map_err(StoreError::persistence)
    }
}

impl RecordRepository for XlsxRecordRepo {
    fn append(&self, record: &Record) -> Result<(), StoreError> {
        self.modify(|sheet| {
            let row = sheet.get_highest_row().max(Position::HEADER.0) + 1;
            write_row(sheet, row, &record.to_row());
            tracing::info!(row, "appended record");
            Ok(())
        })
    }

    fn list(&self) -> Result<Vec<StoredRecord>, StoreError> {
        let rows = self.read_all()?;
        let mut records: Vec<StoredRecord> = rows
            .iter()
            .enumerate()
            .skip(1)
            .map(|(idx, cells)| StoredRecord {
                record: Record::from_row(cells),
                position: Position(idx as u32 + 1),
            })
            .filter(|stored| !stored.record.is_blank())
            .collect();
        records.reverse();

        tracing::debug!(count = records.len(), "listed records");
        Ok(records)
    }

    fn fetch(&self, position: Position) -> Result<Record, StoreError> {
        let rows = self.read_all()?;
        Self::check_bounds(position, rows.len() as u32)?;
        Ok(Record::from_row(&rows[position.0 as usize - 1]))
    }

    fn update(&self, position: Position, record: &Record) -> Result<(), StoreError> {
        self.modify(|sheet| {
            Self::check_bounds(position, sheet.get_highest_row())?;
            write_row(sheet, position.0, &record.to_row());
            tracing::info!(%position, "updated record");
            Ok(())
        })
    }

    fn delete(&self, position: Position) -> Result<(), StoreError> {
        self.modify(|sheet| {
            Self::check_bounds(position, sheet.get_highest_row())?;
            sheet.remove_row(&position.0, &1);
            tracing::info!(%position, "deleted record");
            Ok(())
        })
    }
}
