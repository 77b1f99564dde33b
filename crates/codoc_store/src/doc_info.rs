//! Persisted document state.

use crate::id::Id;
use chrono::{DateTime, Utc};
use codoc_types::DocumentKey;

/// A persisted document.
#[derive(Clone, Debug)]
pub struct DocInfo {
    /// Internal id.
    pub id: Id,
    /// The (collection, document) key.
    pub key: DocumentKey,
    /// Id of the client that first created the document.
    pub owner: Id,
    /// Highest server sequence assigned to any change of this document.
    /// Monotonically non-decreasing.
    pub server_seq: u64,
    /// Last time an attached client accessed the document.
    pub accessed_at: DateTime<Utc>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last time a change was stored.
    pub updated_at: DateTime<Utc>,
}

impl DocInfo {
    /// Creates a fresh document owned by the given client.
    pub fn new(key: DocumentKey, owner: Id) -> Self {
        let now = Utc::now();
        Self {
            id: Id::new(),
            key,
            owner,
            server_seq: 0,
            accessed_at: now,
            created_at: now,
            updated_at: now,
        }
    }

    /// Assigns the next server sequence and returns it.
    pub fn increase_server_seq(&mut self) -> u64 {
        self.server_seq += 1;
        self.server_seq
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_seq_is_dense_from_one() {
        let mut doc = DocInfo::new(DocumentKey::new("c", "d"), Id::new());
        assert_eq!(doc.server_seq, 0);
        assert_eq!(doc.increase_server_seq(), 1);
        assert_eq!(doc.increase_server_seq(), 2);
        assert_eq!(doc.server_seq, 2);
    }
}
