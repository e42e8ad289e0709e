//! Error types for the workbook store.

use thiserror::Error;

/// Errors that can occur while reading or writing a sheet.
#[derive(Debug, Error, Clone)]
pub enum StoreError {
    /// The underlying database rejected an operation
    #[error("Database error: {message}")]
    Database { message: String },

    /// A stored row could not be decoded into cells
    #[error("Malformed row in sheet `{sheet}`: {message}")]
    MalformedRow { sheet: &'static str, message: String },

    /// A cell update targeted a row that does not exist
    #[error("Row {row} does not exist in sheet `{sheet}`")]
    RowOutOfRange { sheet: &'static str, row: usize },

    /// A thread panicked while holding the workbook lock
    #[error("Workbook lock poisoned")]
    Poisoned,

    /// The blocking task running a store call failed
    #[error("Store task failed: {message}")]
    Task { message: String },
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Database {
            message: err.to_string(),
        }
    }
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(err: tokio::task::JoinError) -> Self {
        StoreError::Task {
            message: err.to_string(),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        StoreError::Poisoned
    }
}
