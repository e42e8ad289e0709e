//! Spreadsheet-style tabular store.
//!
//! A workbook holds one sheet per logical table. Each sheet is an ordered
//! list of rows of string cells, and row 0 is the header. The survey and the
//! topic board only ever need four primitives: append a row, read every row,
//! overwrite a cell, and overwrite a cell only if it still holds an expected
//! value.

mod credentials;
mod error;
mod locks;
mod memory;
mod sqlite;

pub use credentials::{CredentialError, KeyFingerprint, ServiceAccount};
pub use error::StoreError;
pub use locks::TableLocks;
pub use memory::MemoryWorkbook;
pub use sqlite::SqliteWorkbook;

use std::sync::Arc;
use tracing::{error, info};

/// The logical tables of the workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sheet {
    Responses,
    Topics,
}

impl Sheet {
    pub const ALL: [Sheet; 2] = [Sheet::Responses, Sheet::Topics];

    pub fn name(self) -> &'static str {
        match self {
            Sheet::Responses => "responses",
            Sheet::Topics => "topics",
        }
    }

    /// Header row written into an empty sheet.
    pub fn header(self) -> &'static [&'static str] {
        match self {
            Sheet::Responses => &["Datetime", "Name", "Feedback", "Selection"],
            Sheet::Topics => &["Id", "Name", "Topic", "Direction", "Votes"],
        }
    }
}

/// Persistence boundary shared by both flows.
///
/// Row and column indices are zero-based and include the header row.
pub trait SheetStore: Send + Sync {
    /// Appends a row after the last row of the sheet and returns its index.
    fn append_row(&self, sheet: Sheet, values: &[String]) -> Result<usize, StoreError>;

    /// Returns every row of the sheet in order, header first.
    fn read_all_rows(&self, sheet: Sheet) -> Result<Vec<Vec<String>>, StoreError>;

    /// Overwrites one cell. Rows shorter than `col` are padded with empty cells.
    fn update_cell(
        &self,
        sheet: Sheet,
        row: usize,
        col: usize,
        value: &str,
    ) -> Result<(), StoreError>;

    /// Overwrites one cell only if it currently holds `expected`.
    ///
    /// Returns `false` without writing when the cell holds anything else.
    fn compare_and_set_cell(
        &self,
        sheet: Sheet,
        row: usize,
        col: usize,
        expected: &str,
        value: &str,
    ) -> Result<bool, StoreError>;

    /// Writes the header row into the sheet if it has no rows yet.
    fn ensure_header(&self, sheet: Sheet) -> Result<(), StoreError> {
        if self.read_all_rows(sheet)?.is_empty() {
            let header: Vec<String> = sheet.header().iter().map(|h| h.to_string()).collect();
            self.append_row(sheet, &header)?;
        }
        Ok(())
    }
}

/// Skips the header row.
pub fn data_rows(rows: &[Vec<String>]) -> &[Vec<String>] {
    rows.get(1..).unwrap_or_default()
}

/// Pads `cells` so that `col` is a valid index.
pub(crate) fn pad_to(cells: &mut Vec<String>, col: usize) {
    if cells.len() <= col {
        cells.resize(col + 1, String::new());
    }
}

/// Async handle over an optional store backend.
///
/// When the workbook could not be opened (for example because credentials
/// were missing) the handle is inert: reads return no rows and writes are
/// skipped, reporting `None` instead of failing.
pub struct Workbook {
    backend: Option<Arc<dyn SheetStore>>,
    unavailable_reason: Option<String>,
    locks: TableLocks,
}

impl Workbook {
    /// Wraps a backend, writing the header row of any empty sheet.
    pub fn new(backend: Arc<dyn SheetStore>) -> Result<Self, StoreError> {
        for sheet in Sheet::ALL {
            backend.ensure_header(sheet)?;
        }

        Ok(Self {
            backend: Some(backend),
            unavailable_reason: None,
            locks: TableLocks::new(),
        })
    }

    /// A workbook whose reads are empty and whose writes are skipped.
    pub fn inert(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        error!("Workbook unavailable, persistence disabled: {}", reason);

        Self {
            backend: None,
            unavailable_reason: Some(reason),
            locks: TableLocks::new(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    /// User-visible reason the workbook is inert, if it is.
    pub fn unavailable_reason(&self) -> Option<&str> {
        self.unavailable_reason.as_deref()
    }

    /// Waits for exclusive write access to a sheet.
    ///
    /// The guard must be held across a read-modify-write. The other methods
    /// of this type do not take the lock themselves, except [`Self::append_row`].
    pub async fn lock_sheet(&self, sheet: Sheet) -> tokio::sync::OwnedMutexGuard<()> {
        self.locks.acquire(sheet).await
    }

    /// Runs a store call on the blocking pool. `None` when inert.
    async fn run<T, F>(&self, f: F) -> Result<Option<T>, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn SheetStore) -> Result<T, StoreError> + Send + 'static,
    {
        let Some(backend) = self.backend.clone() else {
            return Ok(None);
        };

        tokio::task::spawn_blocking(move || f(backend.as_ref()))
            .await?
            .map(Some)
    }

    pub async fn read_all_rows(&self, sheet: Sheet) -> Result<Vec<Vec<String>>, StoreError> {
        Ok(self
            .run(move |store| store.read_all_rows(sheet))
            .await?
            .unwrap_or_default())
    }

    /// Appends a row while holding the sheet lock. `None` when inert.
    pub async fn append_row(
        &self,
        sheet: Sheet,
        values: Vec<String>,
    ) -> Result<Option<usize>, StoreError> {
        let _guard = self.lock_sheet(sheet).await;
        let row = self.run(move |store| store.append_row(sheet, &values)).await?;

        if let Some(row) = row {
            info!(sheet = sheet.name(), row, "Appended row");
        }

        Ok(row)
    }

    /// Compare-and-set on one cell. Returns `false` when inert.
    pub async fn compare_and_set_cell(
        &self,
        sheet: Sheet,
        row: usize,
        col: usize,
        expected: String,
        value: String,
    ) -> Result<bool, StoreError> {
        Ok(self
            .run(move |store| store.compare_and_set_cell(sheet, row, col, &expected, &value))
            .await?
            .unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_data_rows_skips_header() {
        let rows = vec![row(&["Datetime"]), row(&["a"]), row(&["b"])];
        assert_eq!(data_rows(&rows), &rows[1..]);
        assert!(data_rows(&[]).is_empty());
        assert!(data_rows(&rows[..1]).is_empty());
    }

    #[tokio::test]
    async fn test_new_writes_headers_once() {
        let backend = Arc::new(MemoryWorkbook::new());
        Workbook::new(backend.clone()).unwrap();
        let workbook = Workbook::new(backend).unwrap();

        let rows = workbook.read_all_rows(Sheet::Topics).await.unwrap();
        assert_eq!(rows, vec![row(Sheet::Topics.header())]);
    }

    #[tokio::test]
    async fn test_inert_workbook_reads_empty_and_skips_writes() {
        let workbook = Workbook::inert("credentials missing");

        assert!(!workbook.is_available());
        assert_eq!(workbook.unavailable_reason(), Some("credentials missing"));
        assert_eq!(
            workbook.append_row(Sheet::Responses, row(&["x"])).await.unwrap(),
            None
        );
        assert!(workbook.read_all_rows(Sheet::Responses).await.unwrap().is_empty());
        assert!(!workbook
            .compare_and_set_cell(Sheet::Topics, 1, 4, "1".to_string(), "2".to_string())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_append_returns_position_after_header() {
        let workbook = Workbook::new(Arc::new(MemoryWorkbook::new())).unwrap();

        let first = workbook.append_row(Sheet::Responses, row(&["a"])).await.unwrap();
        let second = workbook.append_row(Sheet::Responses, row(&["b"])).await.unwrap();

        assert_eq!(first, Some(1));
        assert_eq!(second, Some(2));
    }
}
