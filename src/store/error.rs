//! Store error types
//!
//! Defines all errors that can occur in the store layer.

use thiserror::Error;

use super::changes::Table;

/// Errors that can occur in the store
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite call failed
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON column could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A stored value could not be read back (bad UUID, timestamp, enum)
    #[error("Corrupt row in {table}: {detail}")]
    Corrupt { table: Table, detail: String },

    /// Requested row does not exist
    #[error("{table} row not found: {id}")]
    NotFound { table: Table, id: String },
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl StoreError {
    pub(crate) fn not_found(table: Table, id: impl ToString) -> Self {
        StoreError::NotFound {
            table,
            id: id.to_string(),
        }
    }

    pub(crate) fn corrupt(table: Table, detail: impl Into<String>) -> Self {
        StoreError::Corrupt {
            table,
            detail: detail.into(),
        }
    }

    /// True when the error means "no such row"
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
