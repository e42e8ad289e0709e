//! In-process workbook that lives as long as the process.

use super::{pad_to, Sheet, SheetStore, StoreError};
use std::collections::HashMap;
use std::sync::Mutex;

/// A workbook that lives only as long as the process.
#[derive(Default)]
pub struct MemoryWorkbook {
    sheets: Mutex<HashMap<Sheet, Vec<Vec<String>>>>,
}

impl MemoryWorkbook {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SheetStore for MemoryWorkbook {
    fn append_row(&self, sheet: Sheet, values: &[String]) -> Result<usize, StoreError> {
        let mut sheets = self.sheets.lock()?;
        let rows = sheets.entry(sheet).or_default();
        rows.push(values.to_vec());
        Ok(rows.len() - 1)
    }

    fn read_all_rows(&self, sheet: Sheet) -> Result<Vec<Vec<String>>, StoreError> {
        let sheets = self.sheets.lock()?;
        Ok(sheets.get(&sheet).cloned().unwrap_or_default())
    }

    fn update_cell(
        &self,
        sheet: Sheet,
        row: usize,
        col: usize,
        value: &str,
    ) -> Result<(), StoreError> {
        let mut sheets = self.sheets.lock()?;
        let cells = sheets
            .get_mut(&sheet)
            .and_then(|rows| rows.get_mut(row))
            .ok_or(StoreError::RowOutOfRange {
                sheet: sheet.name(),
                row,
            })?;

        pad_to(cells, col);
        cells[col] = value.to_string();
        Ok(())
    }

    fn compare_and_set_cell(
        &self,
        sheet: Sheet,
        row: usize,
        col: usize,
        expected: &str,
        value: &str,
    ) -> Result<bool, StoreError> {
        let mut sheets = self.sheets.lock()?;
        let cells = sheets
            .get_mut(&sheet)
            .and_then(|rows| rows.get_mut(row))
            .ok_or(StoreError::RowOutOfRange {
                sheet: sheet.name(),
                row,
            })?;

        if cells.get(col).map(String::as_str).unwrap_or("") != expected {
            return Ok(false);
        }

        pad_to(cells, col);
        cells[col] = value.to_string();
        Ok(true)
    }
}
