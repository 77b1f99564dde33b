//! The unit of edit.

use crate::actor::ActorId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a change before the server sequences it.
///
/// `(client_seq, lamport, actor)` uniquely identifies a change across the
/// whole system; `client_seq` is strictly increasing within one client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChangeId {
    /// Client-local sequence of the change.
    pub client_seq: u32,
    /// Lamport timestamp of the change.
    pub lamport: u64,
    /// The actor that created the change.
    pub actor: ActorId,
}

impl ChangeId {
    /// Creates a change id.
    #[must_use]
    pub const fn new(client_seq: u32, lamport: u64, actor: ActorId) -> Self {
        Self {
            client_seq,
            lamport,
            actor,
        }
    }
}

impl fmt::Display for ChangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.client_seq, self.lamport, self.actor)
    }
}

/// A single edit to a document.
///
/// Operations are opaque byte blobs; the core orders and stores them without
/// decoding. Once persisted, a change carries the server sequence assigned
/// during push (`0` until then).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    /// Identity of the change.
    pub id: ChangeId,
    /// Optional human-readable description.
    pub message: Option<String>,
    /// Ordered opaque operation payloads.
    pub operations: Vec<Vec<u8>>,
    /// Server sequence, assigned on push. Zero for unsequenced changes.
    pub server_seq: u64,
}

impl Change {
    /// Creates an unsequenced change.
    #[must_use]
    pub fn new(id: ChangeId, message: Option<String>, operations: Vec<Vec<u8>>) -> Self {
        Self {
            id,
            message,
            operations,
            server_seq: 0,
        }
    }

    /// Returns the number of operations.
    #[must_use]
    pub fn operations_len(&self) -> usize {
        self.operations.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_change_is_unsequenced() {
        let id = ChangeId::new(1, 1, ActorId::random());
        let change = Change::new(id, None, vec![vec![1, 2], vec![3]]);
        assert_eq!(change.server_seq, 0);
        assert_eq!(change.operations_len(), 2);
    }

    #[test]
    fn change_id_display() {
        let id = ChangeId::new(2, 9, ActorId::initial());
        assert_eq!(id.to_string(), "2:9:000000000000000000000000");
    }
}
