//! SQLite-backed workbook.

use super::{pad_to, Sheet, SheetStore, StoreError};
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::sync::Mutex;

const SCHEMA_SQL: &str = include_str!("../../../../sql/init_workbook.sql");

pub struct SqliteWorkbook {
    db: Mutex<Connection>,
}

impl SqliteWorkbook {
    /// Opens (or creates) the workbook file and initializes the schema.
    pub fn open(db_path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(db_path)?;
        conn.execute_batch(SCHEMA_SQL)?;

        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA_SQL)?;

        Ok(Self {
            db: Mutex::new(conn),
        })
    }
}

fn decode_cells(sheet: Sheet, raw: &str) -> Result<Vec<String>, StoreError> {
    serde_json::from_str(raw).map_err(|e| StoreError::MalformedRow {
        sheet: sheet.name(),
        message: e.to_string(),
    })
}

fn encode_cells(sheet: Sheet, cells: &[String]) -> Result<String, StoreError> {
    serde_json::to_string(cells).map_err(|e| StoreError::MalformedRow {
        sheet: sheet.name(),
        message: e.to_string(),
    })
}

/// Loads one row inside a transaction.
fn load_row(tx: &Transaction<'_>, sheet: Sheet, row: usize) -> Result<Vec<String>, StoreError> {
    let raw: Option<String> = tx
        .query_row(
            "SELECT cells FROM sheet_rows WHERE sheet = ?1 AND position = ?2",
            (sheet.name(), row as i64),
            |r| r.get(0),
        )
        .optional()?;

    match raw {
        Some(raw) => decode_cells(sheet, &raw),
        None => Err(StoreError::RowOutOfRange {
            sheet: sheet.name(),
            row,
        }),
    }
}

fn store_row(
    tx: &Transaction<'_>,
    sheet: Sheet,
    row: usize,
    cells: &[String],
) -> Result<(), StoreError> {
    tx.execute(
        "UPDATE sheet_rows SET cells = ?1, updated_at = datetime('now')
         WHERE sheet = ?2 AND position = ?3",
        (encode_cells(sheet, cells)?, sheet.name(), row as i64),
    )?;
    Ok(())
}

impl SheetStore for SqliteWorkbook {
    fn append_row(&self, sheet: Sheet, values: &[String]) -> Result<usize, StoreError> {
        let mut db = self.db.lock()?;
        let tx = db.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let next: i64 = tx.query_row(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM sheet_rows WHERE sheet = ?1",
            [sheet.name()],
            |r| r.get(0),
        )?;

        tx.execute(
            "INSERT INTO sheet_rows (sheet, position, cells, created_at, updated_at)
             VALUES (?1, ?2, ?3, datetime('now'), datetime('now'))",
            (sheet.name(), next, encode_cells(sheet, values)?),
        )?;
        tx.commit()?;

        Ok(next as usize)
    }

    fn read_all_rows(&self, sheet: Sheet) -> Result<Vec<Vec<String>>, StoreError> {
        let db = self.db.lock()?;
        let mut stmt =
            db.prepare("SELECT cells FROM sheet_rows WHERE sheet = ?1 ORDER BY position")?;

        let raw_rows = stmt
            .query_map([sheet.name()], |r| r.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        raw_rows
            .iter()
            .map(|raw| decode_cells(sheet, raw))
            .collect()
    }

    fn update_cell(
        &self,
        sheet: Sheet,
        row: usize,
        col: usize,
        value: &str,
    ) -> Result<(), StoreError> {
        let mut db = self.db.lock()?;
        let tx = db.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut cells = load_row(&tx, sheet, row)?;
        pad_to(&mut cells, col);
        cells[col] = value.to_string();
        store_row(&tx, sheet, row, &cells)?;

        tx.commit()?;
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
        let mut db = self.db.lock()?;
        // IMMEDIATE takes the write lock up front so another process sharing
        // the file cannot write between the read and the update.
        let tx = db.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut cells = load_row(&tx, sheet, row)?;
        if cells.get(col).map(String::as_str).unwrap_or("") != expected {
            return Ok(false);
        }

        pad_to(&mut cells, col);
        cells[col] = value.to_string();
        store_row(&tx, sheet, row, &cells)?;

        tx.commit()?;
        Ok(true)
    }
}
