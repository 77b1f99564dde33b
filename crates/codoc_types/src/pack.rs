//! The transport unit exchanged between client and server.

use crate::change::Change;
use crate::checkpoint::Checkpoint;
use crate::ticket::Ticket;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Key of a document: the collection it lives in plus its name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentKey {
    /// Collection the document belongs to.
    pub collection: String,
    /// Name of the document within the collection.
    pub document: String,
}

impl DocumentKey {
    /// Creates a document key.
    pub fn new(collection: impl Into<String>, document: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            document: document.into(),
        }
    }

    /// Returns the combined `collection$document` form used for storage and
    /// lock keys.
    #[must_use]
    pub fn combined(&self) -> String {
        format!("{}${}", self.collection, self.document)
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}${}", self.collection, self.document)
    }
}

/// A pack of changes for one document.
///
/// Clients send a pack carrying their checkpoint and any local changes; the
/// server answers with a pack carrying the advanced checkpoint and either
/// the missing changes or a snapshot, plus the document's minimum synced
/// ticket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangePack {
    /// Key of the document this pack belongs to.
    pub document_key: DocumentKey,
    /// The sender's checkpoint.
    pub checkpoint: Checkpoint,
    /// Changes carried by the pack, in order.
    pub changes: Vec<Change>,
    /// Snapshot bytes. Empty on requests; set on pull responses when the
    /// client is too far behind to catch up with changes.
    pub snapshot: Option<Vec<u8>>,
    /// Logical time below which the client may collect garbage.
    pub min_synced_ticket: Option<Ticket>,
}

impl ChangePack {
    /// Creates a pack.
    #[must_use]
    pub fn new(
        document_key: DocumentKey,
        checkpoint: Checkpoint,
        changes: Vec<Change>,
        snapshot: Option<Vec<u8>>,
    ) -> Self {
        Self {
            document_key,
            checkpoint,
            changes,
            snapshot,
            min_synced_ticket: None,
        }
    }

    /// Returns true if the pack carries any changes.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Returns the number of changes.
    #[must_use]
    pub fn changes_len(&self) -> usize {
        self.changes.len()
    }

    /// Returns the total number of operations across all changes.
    #[must_use]
    pub fn operations_len(&self) -> usize {
        self.changes.iter().map(Change::operations_len).sum()
    }

    /// Returns the size of the snapshot in bytes.
    #[must_use]
    pub fn snapshot_len(&self) -> usize {
        self.snapshot.as_ref().map_or(0, Vec::len)
    }
}
