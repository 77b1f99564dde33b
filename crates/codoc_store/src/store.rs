//! Store trait definition.

use crate::change_info::ChangeInfo;
use crate::client_info::ClientInfo;
use crate::doc_info::DocInfo;
use crate::error::StoreResult;
use crate::id::Id;
use crate::snapshot_info::SnapshotInfo;
use async_trait::async_trait;
use codoc_types::{Change, DocumentKey, Ticket};

/// Abstract persistence for the sync core.
///
/// Backends persist five tables: clients, documents, changes, snapshots and
/// synced sequences. Every method is a single logical round-trip; callers
/// bound it with a deadline and treat dropping the future as cancellation.
///
/// # Invariants
///
/// - Changes are write-once: `store_changes` upserts by
///   `(doc_id, server_seq)` and nothing ever updates or deletes them.
/// - An observer that reads a document's `server_seq == n` also reads every
///   change with `server_seq <= n` and none above.
/// - `find_changes` / `find_change_infos` return rows in ascending
///   `server_seq` order.
///
/// # Implementors
///
/// - [`super::MemoryStore`] - in-process tables for tests and ephemeral
///   deployments
/// - Database-backed implementations (for example MongoDB) live outside
///   this crate and map [`super::StoreError::Unavailable`] onto their
///   transport failures
#[async_trait]
pub trait Store: Send + Sync {
    /// Activates the client with the given key, creating it on first use.
    async fn activate_client(&self, key: &str) -> StoreResult<ClientInfo>;

    /// Deactivates the client with the given id.
    ///
    /// # Errors
    ///
    /// Returns `ClientNotFound` if no such client exists.
    async fn deactivate_client(&self, id: Id) -> StoreResult<ClientInfo>;

    /// Finds the client with the given id.
    async fn find_client(&self, id: Id) -> StoreResult<ClientInfo>;

    /// Persists a client's per-document state after a push-pull.
    ///
    /// For an attached document the stored sequences advance monotonically
    /// (component-wise max); for a detached one they reset to zero.
    async fn update_client_after_push_pull(
        &self,
        client: &ClientInfo,
        doc: &DocInfo,
    ) -> StoreResult<()>;

    /// Finds the document with the given key, bumping its access time.
    ///
    /// With `create_if_not_exist` the document is created on first access
    /// and owned by `owner`.
    ///
    /// # Errors
    ///
    /// Returns `DocumentNotFound` when the document is missing and creation
    /// was not requested.
    async fn find_doc(
        &self,
        owner: Id,
        key: &DocumentKey,
        create_if_not_exist: bool,
    ) -> StoreResult<DocInfo>;

    /// Stores sequenced changes and advances the document's server
    /// sequence with a compare-and-set against `initial_server_seq`.
    ///
    /// Each change is upserted by `(doc_id, server_seq)`. The CAS and the
    /// change writes are atomic where the backend supports transactions;
    /// otherwise pull reads stay bounded by the document's `server_seq`, so
    /// changes persisted past a failed CAS are orphans and never observed.
    ///
    /// # Errors
    ///
    /// Returns `ConflictOnUpdate` when the document's stored sequence no
    /// longer equals `initial_server_seq`.
    async fn store_changes(
        &self,
        doc: &DocInfo,
        initial_server_seq: u64,
        changes: &[Change],
    ) -> StoreResult<()>;

    /// Returns the changes with `server_seq` in `[from, to]`, ascending.
    async fn find_changes(&self, doc_id: Id, from: u64, to: u64) -> StoreResult<Vec<Change>>;

    /// Returns the change records with `server_seq` in `[from, to]`,
    /// ascending.
    async fn find_change_infos(
        &self,
        doc_id: Id,
        from: u64,
        to: u64,
    ) -> StoreResult<Vec<ChangeInfo>>;

    /// Stores a snapshot of the document at the given server sequence.
    async fn create_snapshot(
        &self,
        doc_id: Id,
        server_seq: u64,
        snapshot: Vec<u8>,
    ) -> StoreResult<()>;

    /// Returns the snapshot with the highest server sequence, if any.
    async fn find_last_snapshot(&self, doc_id: Id) -> StoreResult<Option<SnapshotInfo>>;

    /// Updates the client's synced sequence for the document and returns
    /// the document's minimum synced ticket.
    ///
    /// An attached client's row is upserted to `server_seq`; a detached
    /// client's row is deleted. The result is the ticket of the change at
    /// the minimum remaining row, or [`Ticket::initial`] when no row exists
    /// or the minimum is zero.
    async fn update_and_find_min_synced_ticket(
        &self,
        client: &ClientInfo,
        doc_id: Id,
        server_seq: u64,
    ) -> StoreResult<Ticket>;
}
