//! Per-sheet write serialization.

use super::Sheet;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async lock per logical table.
///
/// Every mutation of a sheet made through [`super::Workbook`] holds that
/// sheet's lock, so in-process writers never interleave a read-modify-write.
#[derive(Default)]
pub struct TableLocks {
    locks: DashMap<Sheet, Arc<Mutex<()>>>,
}

impl TableLocks {
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Gets or creates the lock for the given sheet.
    pub fn get(&self, sheet: Sheet) -> Arc<Mutex<()>> {
        self.locks
            .entry(sheet)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Waits for exclusive write access to the sheet.
    pub async fn acquire(&self, sheet: Sheet) -> OwnedMutexGuard<()> {
        self.get(sheet).lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_sheet_shares_lock() {
        let locks = TableLocks::new();
        assert!(Arc::ptr_eq(&locks.get(Sheet::Topics), &locks.get(Sheet::Topics)));
        assert!(!Arc::ptr_eq(&locks.get(Sheet::Topics), &locks.get(Sheet::Responses)));
    }

    #[tokio::test]
    async fn test_acquire_is_exclusive_per_sheet() {
        let locks = TableLocks::new();
        let _topics = locks.acquire(Sheet::Topics).await;

        assert!(locks.get(Sheet::Topics).try_lock().is_err());
        assert!(locks.get(Sheet::Responses).try_lock().is_ok());
    }
}
