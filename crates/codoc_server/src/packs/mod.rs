//! The PushPull pipeline.
//!
//! A push-pull request runs under the document's write lock: the push
//! stage appends the client's changes to the log, the pull stage computes
//! the response window (changes or a snapshot), client bookkeeping and the
//! minimum synced ticket are updated, and watchers are notified once the
//! lock is released.

mod pull;
mod push;
mod snapshot;

use crate::backend::{push_pull_key, Backend};
use crate::error::SyncResult;
use crate::event::{DocEvent, DocEventKind};
use codoc_store::{ChangeInfo, ClientInfo, DocInfo, Id};
use codoc_types::{ChangePack, Checkpoint, DocumentKey, Ticket};
use std::sync::Arc;

/// Number of changes read per round when rebuilding a document from the
/// log, bounding memory on long tails.
pub(crate) const REBUILD_BATCH: u64 = 100;

/// The server's half of a push-pull exchange.
///
/// Shaped like a [`ChangePack`] but carrying persisted [`ChangeInfo`] rows
/// to avoid converting back and forth inside the pipeline.
#[derive(Clone, Debug)]
pub struct ServerPack {
    /// Key of the document.
    pub document_key: DocumentKey,
    /// The checkpoint the client should adopt.
    pub checkpoint: Checkpoint,
    /// Changes the client is missing, ascending by server sequence.
    pub changes: Vec<ChangeInfo>,
    /// Snapshot bytes when the client is too far behind for changes.
    pub snapshot: Option<Vec<u8>>,
    /// Logical time below which the client may collect garbage.
    pub min_synced_ticket: Option<Ticket>,
}

impl ServerPack {
    /// Creates a server pack.
    #[must_use]
    pub fn new(
        document_key: DocumentKey,
        checkpoint: Checkpoint,
        changes: Vec<ChangeInfo>,
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

    /// Returns the number of changes.
    #[must_use]
    pub fn changes_len(&self) -> usize {
        self.changes.len()
    }

    /// Returns the total number of operations across all changes.
    #[must_use]
    pub fn operations_len(&self) -> usize {
        self.changes.iter().map(|info| info.operations.len()).sum()
    }

    /// Returns the size of the snapshot in bytes.
    #[must_use]
    pub fn snapshot_len(&self) -> usize {
        self.snapshot.as_ref().map_or(0, Vec::len)
    }

    /// Converts into the wire-level pack.
    #[must_use]
    pub fn into_change_pack(self) -> ChangePack {
        let mut pack = ChangePack::new(
            self.document_key,
            self.checkpoint,
            self.changes.iter().map(ChangeInfo::to_change).collect(),
            self.snapshot,
        );
        pack.min_synced_ticket = self.min_synced_ticket;
        pack
    }
}

/// Runs one push-pull exchange for a client whose attachment state is
/// already up to date.
///
/// `doc_info` may be stale; the authoritative sequence is re-read under
/// the document's push-pull lock. On success the returned pack reflects
/// the document at its post-push sequence; on failure nothing past the
/// push stage's compare-and-set is observable to other clients.
pub async fn push_pull(
    backend: &Arc<Backend>,
    client_info: &mut ClientInfo,
    doc_info: DocInfo,
    request_pack: &ChangePack,
) -> SyncResult<ServerPack> {
    let guard = backend
        .lockers
        .lock(&push_pull_key(doc_info.id), backend.shutdown_token())
        .await?;

    // The copy the caller loaded predates the lock; another writer may
    // have committed in between.
    let mut doc_info = backend
        .store
        .find_doc(client_info.id, &doc_info.key, false)
        .await?;
    let initial_server_seq = doc_info.server_seq;

    let pushed_cp = push::push_changes(
        backend,
        client_info,
        &mut doc_info,
        request_pack,
        initial_server_seq,
    )
    .await?;

    // The pull window stays bounded by the pre-push sequence, so a client
    // never receives the changes it sent in this request; the pulled
    // checkpoint still advances to the post-push sequence.
    let mut response = pull::pull_pack(
        backend,
        client_info,
        &doc_info,
        request_pack,
        pushed_cp,
        initial_server_seq,
    )
    .await?;

    client_info.update_checkpoint(doc_info.id, response.checkpoint)?;
    backend
        .store
        .update_client_after_push_pull(client_info, &doc_info)
        .await?;

    let min_synced_ticket = backend
        .store
        .update_and_find_min_synced_ticket(
            client_info,
            doc_info.id,
            response.checkpoint.server_seq,
        )
        .await?;
    response.min_synced_ticket = Some(min_synced_ticket);

    drop(guard);

    backend.events.publish(DocEvent {
        kind: DocEventKind::DocumentsChanged,
        document_key: doc_info.key.combined(),
        actor: client_info.id.as_actor_id(),
    });

    if request_pack.has_changes() && snapshot::snapshot_due(&backend.config, doc_info.server_seq) {
        snapshot::spawn_snapshot(Arc::clone(backend), doc_info);
    }

    Ok(response)
}

/// Rebuilds a document's snapshot bytes by folding the changes in
/// `[from, to]` into `snapshot`, reading the log in batches.
pub(crate) async fn materialize(
    backend: &Backend,
    doc_id: Id,
    from: u64,
    to: u64,
    snapshot: &[u8],
) -> SyncResult<Vec<u8>> {
    let mut doc = backend.materializer.open(snapshot)?;

    let mut cursor = from;
    while cursor <= to {
        let upper = to.min(cursor + REBUILD_BATCH - 1);
        let changes = backend.store.find_changes(doc_id, cursor, upper).await?;
        for change in &changes {
            doc.apply(change)?;
        }
        cursor = upper + 1;
    }

    Ok(doc.serialize()?)
}
