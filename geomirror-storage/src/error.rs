//! Error types for the local store.

use thiserror::Error;

/// All errors that can occur in local store operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("not found: {0}")]
    NotFound(String),

    /// A unique key already exists (feature external id, attachment pair,
    /// municipality name).
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("constraint violated: {0}")]
    Constraint(String),
}

impl StorageError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StorageError::Conflict(_))
    }
}

pub type StorageResult<T> = Result<T, StorageError>;
