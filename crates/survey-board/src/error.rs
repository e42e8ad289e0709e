//! Error types for the survey and topic board flows.

use crate::slots::SlotParseError;
use crate::store::StoreError;
use thiserror::Error;
use uuid::Uuid;

/// Errors from submitting or summarizing availability responses.
#[derive(Debug, Error, Clone)]
pub enum SurveyError {
    /// Submission had no slots checked
    #[error("Select at least one time slot")]
    NoSlotsSelected,

    /// Submission named a slot that is not on the grid
    #[error("Unknown time slot: {0}")]
    UnknownSlot(#[from] SlotParseError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from the topic board.
#[derive(Debug, Error, Clone)]
pub enum TopicError {
    /// A required text field was empty
    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("No topic with id {id}")]
    NotFound { id: Uuid },

    /// The stored row for a topic could not be read back
    #[error("Topic row {row} is malformed: {message}")]
    CorruptRow { row: usize, message: String },

    /// Every compare-and-set attempt lost to a concurrent writer
    #[error("Vote on topic {id} still conflicting after {attempts} attempts")]
    Contended { id: Uuid, attempts: u32 },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SurveyError {
    /// Returns true if the user can fix this by changing the submission.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            SurveyError::NoSlotsSelected | SurveyError::UnknownSlot(_)
        )
    }
}

impl TopicError {
    /// Returns true if the user can fix this by changing the submission.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            TopicError::MissingField { .. } | TopicError::NotFound { .. }
        )
    }
}
