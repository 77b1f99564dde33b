//! Error types for store operations.

use crate::id::Id;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No client with the given id exists.
    #[error("client not found: {0}")]
    ClientNotFound(Id),

    /// The client exists but has been deactivated.
    #[error("client not activated: {0}")]
    ClientNotActivated(Id),

    /// No document with the given key or id exists.
    #[error("document not found: {0}")]
    DocumentNotFound(String),

    /// The client is not attached to the document.
    #[error("document not attached: client {client_id}, document {doc_id}")]
    DocumentNotAttached {
        /// The client.
        client_id: Id,
        /// The document.
        doc_id: Id,
    },

    /// Compare-and-set on the document's server sequence failed.
    ///
    /// Under intact lock discipline this cannot happen; seeing it means a
    /// second writer bypassed the push-pull lock.
    #[error("conflict on update: document {doc_id} server_seq moved past {expected}")]
    ConflictOnUpdate {
        /// The document whose sequence moved.
        doc_id: Id,
        /// The sequence the writer expected to find.
        expected: u64,
    },

    /// Transport-level failure talking to the backend. Retryable.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Returns true if the caller may retry the operation as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_unavailable_is_retryable() {
        assert!(StoreError::Unavailable("timeout".into()).is_retryable());
        assert!(!StoreError::ClientNotFound(Id::new()).is_retryable());
        assert!(!StoreError::ConflictOnUpdate {
            doc_id: Id::new(),
            expected: 3
        }
        .is_retryable());
    }

    #[test]
    fn display_carries_context() {
        let id = Id::from_bytes([1; 12]);
        let msg = StoreError::ClientNotFound(id).to_string();
        assert!(msg.contains(&id.to_hex()));
    }
}
