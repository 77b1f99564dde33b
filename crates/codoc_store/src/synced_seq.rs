//! Per-client synced sequence tracking.

use crate::id::Id;

/// The highest server sequence a client has acknowledged for a document.
///
/// A row exists iff the client is currently attached to the document; the
/// minimum across a document's rows drives garbage collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyncedSeqInfo {
    /// The document.
    pub doc_id: Id,
    /// The attached client.
    pub client_id: Id,
    /// Highest acknowledged server sequence.
    pub server_seq: u64,
}
