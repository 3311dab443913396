// ⚠️ Error Model - every failure the expense core can report
//
// The store, edit session and importer all return `ExpenseError`.
// Callers (CLI, TUI) turn it into a message with `user_message()`.

use crate::expense::ExpenseId;
use crate::import::REQUIRED_COLUMNS;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExpenseError>;

#[derive(Debug, Error)]
pub enum ExpenseError {
    /// A field was rejected before anything touched the store
    #[error("invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    /// The identity is no longer live (deleted, cleared, or never existed)
    #[error("expense {0} not found")]
    NotFound(ExpenseId),

    /// Confirm was requested without a record selected for editing
    #[error("no edit in progress")]
    NoEditInProgress,

    /// The database could not be opened, read or written
    #[error("expense store {} unavailable: {source}", path.display())]
    StoreUnavailable {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Uploaded file is missing required columns or could not be parsed
    #[error("import rejected: {reason}")]
    ImportRejected { reason: String },
}

impl ExpenseError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        ExpenseError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn import_rejected(reason: impl Into<String>) -> Self {
        ExpenseError::ImportRejected {
            reason: reason.into(),
        }
    }

    /// Failures worth retrying as-is once the user closes whatever holds the file
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExpenseError::StoreUnavailable { .. })
    }

    /// Message shown to the user at the CLI / TUI boundary
    pub fn user_message(&self) -> String {
        match self {
            ExpenseError::Validation { field, message } => {
                format!("Please check the {} field: {}", field, message)
            }
            ExpenseError::NotFound(id) => {
                format!("Expense {} no longer exists. Nothing was changed.", id)
            }
            ExpenseError::NoEditInProgress => {
                "No expense is selected for editing.".to_string()
            }
            ExpenseError::StoreUnavailable { path, source } => format!(
                "The expense database '{}' is currently unavailable ({}). Close any other program using it and try again.",
                path.display(),
                source
            ),
            ExpenseError::ImportRejected { reason } => format!(
                "{}. The file must contain the columns: {}",
                reason,
                REQUIRED_COLUMNS.join(", ")
            ),
        }
    }
}
