//! In-memory store implementation.

use crate::change_info::ChangeInfo;
use crate::client_info::{AttachStatus, ClientDocInfo, ClientInfo, ClientStatus};
use crate::doc_info::DocInfo;
use crate::error::{StoreError, StoreResult};
use crate::id::Id;
use crate::snapshot_info::SnapshotInfo;
use crate::store::Store;
use crate::synced_seq::SyncedSeqInfo;
use async_trait::async_trait;
use chrono::Utc;
use codoc_types::{Change, DocumentKey, Ticket};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

/// An in-memory store.
///
/// All five tables live behind a single lock, which makes the change-write
/// plus server-seq CAS in [`Store::store_changes`] naturally atomic.
/// Suitable for tests and single-process ephemeral deployments.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    clients: HashMap<Id, ClientInfo>,
    clients_by_key: HashMap<String, Id>,
    docs: HashMap<Id, DocInfo>,
    docs_by_key: HashMap<String, Id>,
    /// Per-document change log, keyed by server_seq for ordered range reads.
    changes: HashMap<Id, BTreeMap<u64, ChangeInfo>>,
    snapshots: HashMap<Id, BTreeMap<u64, SnapshotInfo>>,
    synced_seqs: HashMap<Id, HashMap<Id, u64>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of persisted changes for a document.
    ///
    /// Test observability helper.
    #[must_use]
    pub fn change_count(&self, doc_id: Id) -> usize {
        self.tables
            .read()
            .changes
            .get(&doc_id)
            .map_or(0, BTreeMap::len)
    }

    /// Returns the number of snapshots for a document.
    ///
    /// Test observability helper.
    #[must_use]
    pub fn snapshot_count(&self, doc_id: Id) -> usize {
        self.tables
            .read()
            .snapshots
            .get(&doc_id)
            .map_or(0, BTreeMap::len)
    }

    /// Returns the synced-seq rows for a document, ascending by sequence.
    ///
    /// Test observability helper.
    #[must_use]
    pub fn synced_seqs(&self, doc_id: Id) -> Vec<SyncedSeqInfo> {
        let tables = self.tables.read();
        let mut rows: Vec<SyncedSeqInfo> = tables
            .synced_seqs
            .get(&doc_id)
            .map(|rows| {
                rows.iter()
                    .map(|(client_id, server_seq)| SyncedSeqInfo {
                        doc_id,
                        client_id: *client_id,
                        server_seq: *server_seq,
                    })
                    .collect()
            })
            .unwrap_or_default();
        rows.sort_by_key(|row| row.server_seq);
        rows
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn activate_client(&self, key: &str) -> StoreResult<ClientInfo> {
        let mut tables = self.tables.write();

        if let Some(id) = tables.clients_by_key.get(key).copied() {
            let client = tables
                .clients
                .get_mut(&id)
                .ok_or(StoreError::ClientNotFound(id))?;
            client.status = ClientStatus::Activated;
            client.updated_at = Utc::now();
            return Ok(client.clone());
        }

        let client = ClientInfo::new(key);
        tables.clients_by_key.insert(key.to_owned(), client.id);
        tables.clients.insert(client.id, client.clone());
        Ok(client)
    }

    async fn deactivate_client(&self, id: Id) -> StoreResult<ClientInfo> {
        let mut tables = self.tables.write();
        let client = tables
            .clients
            .get_mut(&id)
            .ok_or(StoreError::ClientNotFound(id))?;
        client.status = ClientStatus::Deactivated;
        client.updated_at = Utc::now();
        Ok(client.clone())
    }

    async fn find_client(&self, id: Id) -> StoreResult<ClientInfo> {
        self.tables
            .read()
            .clients
            .get(&id)
            .cloned()
            .ok_or(StoreError::ClientNotFound(id))
    }

    async fn update_client_after_push_pull(
        &self,
        client: &ClientInfo,
        doc: &DocInfo,
    ) -> StoreResult<()> {
        let doc_state =
            client
                .documents
                .get(&doc.id)
                .copied()
                .ok_or(StoreError::DocumentNotAttached {
                    client_id: client.id,
                    doc_id: doc.id,
                })?;

        let mut tables = self.tables.write();
        let stored = tables
            .clients
            .get_mut(&client.id)
            .ok_or(StoreError::ClientNotFound(client.id))?;

        let entry = stored.documents.entry(doc.id).or_insert(ClientDocInfo {
            server_seq: 0,
            client_seq: 0,
            status: AttachStatus::Detached,
        });
        if doc_state.status == AttachStatus::Attached {
            entry.server_seq = entry.server_seq.max(doc_state.server_seq);
            entry.client_seq = entry.client_seq.max(doc_state.client_seq);
        } else {
            entry.server_seq = 0;
            entry.client_seq = 0;
        }
        entry.status = doc_state.status;
        stored.updated_at = Utc::now();
        Ok(())
    }

    async fn find_doc(
        &self,
        owner: Id,
        key: &DocumentKey,
        create_if_not_exist: bool,
    ) -> StoreResult<DocInfo> {
        let combined = key.combined();
        let mut tables = self.tables.write();

        if let Some(id) = tables.docs_by_key.get(&combined).copied() {
            let doc = tables
                .docs
                .get_mut(&id)
                .ok_or_else(|| StoreError::DocumentNotFound(combined.clone()))?;
            doc.accessed_at = Utc::now();
            return Ok(doc.clone());
        }

        if !create_if_not_exist {
            return Err(StoreError::DocumentNotFound(combined));
        }

        let doc = DocInfo::new(key.clone(), owner);
        tables.docs_by_key.insert(combined, doc.id);
        tables.docs.insert(doc.id, doc.clone());
        Ok(doc)
    }

    async fn store_changes(
        &self,
        doc: &DocInfo,
        initial_server_seq: u64,
        changes: &[Change],
    ) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let stored = tables
            .docs
            .get_mut(&doc.id)
            .ok_or_else(|| StoreError::DocumentNotFound(doc.key.combined()))?;

        if stored.server_seq != initial_server_seq {
            return Err(StoreError::ConflictOnUpdate {
                doc_id: doc.id,
                expected: initial_server_seq,
            });
        }
        stored.server_seq = doc.server_seq;
        stored.updated_at = Utc::now();

        let log = tables.changes.entry(doc.id).or_default();
        for change in changes {
            log.insert(change.server_seq, ChangeInfo::from_change(doc.id, change));
        }
        Ok(())
    }

    async fn find_changes(&self, doc_id: Id, from: u64, to: u64) -> StoreResult<Vec<Change>> {
        Ok(self
            .find_change_infos(doc_id, from, to)
            .await?
            .iter()
            .map(ChangeInfo::to_change)
            .collect())
    }

    async fn find_change_infos(
        &self,
        doc_id: Id,
        from: u64,
        to: u64,
    ) -> StoreResult<Vec<ChangeInfo>> {
        if from > to {
            return Ok(Vec::new());
        }
        Ok(self
            .tables
            .read()
            .changes
            .get(&doc_id)
            .map(|log| log.range(from..=to).map(|(_, info)| info.clone()).collect())
            .unwrap_or_default())
    }

    async fn create_snapshot(
        &self,
        doc_id: Id,
        server_seq: u64,
        snapshot: Vec<u8>,
    ) -> StoreResult<()> {
        self.tables
            .write()
            .snapshots
            .entry(doc_id)
            .or_default()
            .insert(server_seq, SnapshotInfo::new(doc_id, server_seq, snapshot));
        Ok(())
    }

    async fn find_last_snapshot(&self, doc_id: Id) -> StoreResult<Option<SnapshotInfo>> {
        Ok(self
            .tables
            .read()
            .snapshots
            .get(&doc_id)
            .and_then(|snapshots| snapshots.values().next_back().cloned()))
    }

    async fn update_and_find_min_synced_ticket(
        &self,
        client: &ClientInfo,
        doc_id: Id,
        server_seq: u64,
    ) -> StoreResult<Ticket> {
        let mut tables = self.tables.write();

        let rows = tables.synced_seqs.entry(doc_id).or_default();
        if client.is_attached(doc_id) {
            rows.insert(client.id, server_seq);
        } else {
            rows.remove(&client.id);
        }

        let Some(min_synced_seq) = rows.values().min().copied() else {
            return Ok(Ticket::initial());
        };
        if min_synced_seq == 0 {
            return Ok(Ticket::initial());
        }

        let info = tables
            .changes
            .get(&doc_id)
            .and_then(|log| log.get(&min_synced_seq))
            .ok_or_else(|| StoreError::DocumentNotFound(doc_id.to_hex()))?;
        Ok(Ticket::of_change(info.lamport, info.actor))
    }
}
