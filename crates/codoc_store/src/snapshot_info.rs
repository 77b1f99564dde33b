//! Persisted snapshots.

use crate::id::Id;
use chrono::{DateTime, Utc};

/// A materialized document state at a specific server sequence.
///
/// `snapshot` is a self-contained serialization of the document root at
/// exactly `server_seq`. Snapshots accumulate; only the latest is consulted.
#[derive(Clone, Debug)]
pub struct SnapshotInfo {
    /// The document the snapshot belongs to.
    pub doc_id: Id,
    /// The server sequence the snapshot captures.
    pub server_seq: u64,
    /// Serialized document root.
    pub snapshot: Vec<u8>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl SnapshotInfo {
    /// Creates a snapshot record.
    pub fn new(doc_id: Id, server_seq: u64, snapshot: Vec<u8>) -> Self {
        Self {
            doc_id,
            server_seq,
            snapshot,
            created_at: Utc::now(),
        }
    }
}
