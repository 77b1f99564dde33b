//! Error types for the sync pipeline.

use crate::config::ConfigError;
use crate::lock::LockError;
use crate::materializer::MaterializeError;
use codoc_store::StoreError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in the sync pipeline.
///
/// The pipeline recovers nothing locally: the first error aborts the
/// request, locks release through their guards, and the error surfaces to
/// the transport boundary.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The request's checkpoint is ahead of the server's state.
    #[error("invalid server seq: initial {initial}, request pack {requested}")]
    InvalidServerSeq {
        /// The document's server sequence.
        initial: u64,
        /// The server sequence claimed by the request.
        requested: u64,
    },

    /// A pushed change is malformed.
    #[error("invalid change: {0}")]
    InvalidChange(String),

    /// A non-blocking lock attempt found the key held.
    #[error("resource busy")]
    Busy,

    /// The operation was cancelled by shutdown or a caller deadline.
    #[error("operation cancelled")]
    Cancelled,

    /// The configuration is unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Snapshot materialization failed.
    #[error(transparent)]
    Materialize(#[from] MaterializeError),
}

impl From<LockError> for SyncError {
    fn from(err: LockError) -> Self {
        match err {
            LockError::Busy => SyncError::Busy,
            LockError::Cancelled => SyncError::Cancelled,
        }
    }
}

impl SyncError {
    /// Returns true if the request itself was at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidServerSeq { .. }
                | SyncError::InvalidChange(_)
                | SyncError::Store(
                    StoreError::ClientNotFound(_)
                        | StoreError::ClientNotActivated(_)
                        | StoreError::DocumentNotFound(_)
                        | StoreError::DocumentNotAttached { .. }
                )
        )
    }

    /// Returns true if the caller may retry with the same checkpoint.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Busy | SyncError::Cancelled => true,
            SyncError::Store(err) => err.is_retryable(),
            _ => false,
        }
    }
}
