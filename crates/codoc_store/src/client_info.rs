//! Persisted client state.

use crate::error::{StoreError, StoreResult};
use crate::id::Id;
use chrono::{DateTime, Utc};
use codoc_types::Checkpoint;
use std::collections::HashMap;

/// Lifecycle status of a client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClientStatus {
    /// The client may not sync any document.
    Deactivated,
    /// The client may attach documents and sync.
    Activated,
}

/// Whether a client currently participates in a document's sync.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttachStatus {
    /// The client receives and contributes changes.
    Attached,
    /// The client left the document; its sequences are reset.
    Detached,
}

/// A client's per-document bookkeeping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClientDocInfo {
    /// Highest server sequence the client has received.
    pub server_seq: u64,
    /// Highest client sequence the server accepted from it.
    pub client_seq: u32,
    /// Attachment status.
    pub status: AttachStatus,
}

/// A persisted client.
///
/// Clients reference documents by id only; there is no in-memory object
/// graph between client and document records.
#[derive(Clone, Debug)]
pub struct ClientInfo {
    /// Internal id; doubles as the actor id of the client's changes.
    pub id: Id,
    /// Stable external key.
    pub key: String,
    /// Lifecycle status.
    pub status: ClientStatus,
    /// Per-document attachment state, keyed by document id.
    pub documents: HashMap<Id, ClientDocInfo>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl ClientInfo {
    /// Creates an activated client with the given key.
    pub fn new(key: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Id::new(),
            key: key.into(),
            status: ClientStatus::Activated,
            documents: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns an error unless the client is activated.
    pub fn ensure_activated(&self) -> StoreResult<()> {
        if self.status != ClientStatus::Activated {
            return Err(StoreError::ClientNotActivated(self.id));
        }
        Ok(())
    }

    /// Marks the document attached, resetting its sequences.
    pub fn attach_document(&mut self, doc_id: Id) -> StoreResult<()> {
        self.ensure_activated()?;
        self.documents.insert(
            doc_id,
            ClientDocInfo {
                server_seq: 0,
                client_seq: 0,
                status: AttachStatus::Attached,
            },
        );
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Marks the document detached and resets its sequences to zero.
    pub fn detach_document(&mut self, doc_id: Id) -> StoreResult<()> {
        self.ensure_attached(doc_id)?;
        self.documents.insert(
            doc_id,
            ClientDocInfo {
                server_seq: 0,
                client_seq: 0,
                status: AttachStatus::Detached,
            },
        );
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Returns true if the client is attached to the document.
    #[must_use]
    pub fn is_attached(&self, doc_id: Id) -> bool {
        self.documents
            .get(&doc_id)
            .is_some_and(|info| info.status == AttachStatus::Attached)
    }

    /// Returns an error unless the client is attached to the document.
    pub fn ensure_attached(&self, doc_id: Id) -> StoreResult<()> {
        if !self.is_attached(doc_id) {
            return Err(StoreError::DocumentNotAttached {
                client_id: self.id,
                doc_id,
            });
        }
        Ok(())
    }

    /// Returns the client's checkpoint for the document.
    ///
    /// Documents the client never attached read as the initial checkpoint.
    #[must_use]
    pub fn checkpoint(&self, doc_id: Id) -> Checkpoint {
        self.documents
            .get(&doc_id)
            .map_or_else(Checkpoint::initial, |info| {
                Checkpoint::new(info.server_seq, info.client_seq)
            })
    }

    /// Advances the client's checkpoint for the document.
    ///
    /// Each component only moves forward, so a stale retry cannot rewind
    /// the stored view.
    pub fn update_checkpoint(&mut self, doc_id: Id, checkpoint: Checkpoint) -> StoreResult<()> {
        let info = self
            .documents
            .get_mut(&doc_id)
            .ok_or(StoreError::DocumentNotAttached {
                client_id: self.id,
                doc_id,
            })?;
        info.server_seq = info.server_seq.max(checkpoint.server_seq);
        info.client_seq = info.client_seq.max(checkpoint.client_seq);
        self.updated_at = Utc::now();
        Ok(())
    }
}
