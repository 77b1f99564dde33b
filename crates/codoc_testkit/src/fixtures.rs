//! Deterministic test fixtures.

use codoc_types::{ActorId, Change, ChangeId, ChangePack, Checkpoint, DocumentKey};

/// Returns a deterministic actor id filled with `byte`.
#[must_use]
pub fn actor(byte: u8) -> ActorId {
    ActorId::from_bytes([byte; 12])
}

/// Returns a document key in the shared test collection.
#[must_use]
pub fn doc_key(document: &str) -> DocumentKey {
    DocumentKey::new("test-collection", document)
}

/// Builds a request pack without a snapshot.
#[must_use]
pub fn pack(key: DocumentKey, checkpoint: Checkpoint, changes: Vec<Change>) -> ChangePack {
    ChangePack::new(key, checkpoint, changes, None)
}

/// Produces the change sequence of one simulated client.
///
/// Client sequences increase strictly and the lamport clock follows the
/// standard rule: every produced change takes
/// `max(own, observed) + 1`.
#[derive(Debug)]
pub struct ChangeBuilder {
    actor: ActorId,
    client_seq: u32,
    lamport: u64,
}

impl ChangeBuilder {
    /// Creates a builder for the given actor.
    #[must_use]
    pub fn new(actor: ActorId) -> Self {
        Self {
            actor,
            client_seq: 0,
            lamport: 0,
        }
    }

    /// Returns the actor the builder produces changes for.
    #[must_use]
    pub fn actor(&self) -> ActorId {
        self.actor
    }

    /// Records a lamport observed from a remote change.
    pub fn observe(&mut self, lamport: u64) {
        self.lamport = self.lamport.max(lamport);
    }

    /// Produces the next change with the given operation payloads.
    pub fn next(&mut self, operations: Vec<Vec<u8>>) -> Change {
        self.client_seq += 1;
        self.lamport += 1;
        Change::new(
            ChangeId::new(self.client_seq, self.lamport, self.actor),
            None,
            operations,
        )
    }

    /// Produces `n` single-operation changes with distinct payloads.
    pub fn next_n(&mut self, n: usize) -> Vec<Change> {
        (0..n)
            .map(|_| {
                let payload = vec![self.client_seq as u8 + 1];
                self.next(vec![payload])
            })
            .collect()
    }
}
