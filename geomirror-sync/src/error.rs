//! Sync error types.

use geomirror_storage::StorageError;
use geomirror_upstream::UpstreamError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Input lacks what a sync needs (object shape, upstream id, id list).
    /// Nothing was written.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl SyncError {
    pub fn is_malformed(&self) -> bool {
        matches!(self, SyncError::MalformedPayload(_))
    }
}
