//! Persisted change records.

use crate::id::Id;
use codoc_types::{ActorId, Change, ChangeId};

/// A persisted change.
///
/// `(doc_id, server_seq)` is unique per document; rows are write-once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeInfo {
    /// The document the change belongs to.
    pub doc_id: Id,
    /// Server sequence assigned during push.
    pub server_seq: u64,
    /// The actor that created the change.
    pub actor: ActorId,
    /// Client-local sequence of the change.
    pub client_seq: u32,
    /// Lamport timestamp of the change.
    pub lamport: u64,
    /// Optional human-readable description.
    pub message: Option<String>,
    /// Ordered opaque operation payloads.
    pub operations: Vec<Vec<u8>>,
}

impl ChangeInfo {
    /// Builds a record from a sequenced change.
    pub fn from_change(doc_id: Id, change: &Change) -> Self {
        Self {
            doc_id,
            server_seq: change.server_seq,
            actor: change.id.actor,
            client_seq: change.id.client_seq,
            lamport: change.id.lamport,
            message: change.message.clone(),
            operations: change.operations.clone(),
        }
    }

    /// Converts the record back into a change.
    #[must_use]
    pub fn to_change(&self) -> Change {
        let mut change = Change::new(
            ChangeId::new(self.client_seq, self.lamport, self.actor),
            self.message.clone(),
            self.operations.clone(),
        );
        change.server_seq = self.server_seq;
        change
    }
}
