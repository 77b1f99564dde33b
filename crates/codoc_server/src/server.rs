//! Public API of the sync core.

use crate::backend::Backend;
use crate::config::Config;
use crate::error::SyncResult;
use crate::event::DocEvent;
use crate::materializer::Materializer;
use crate::packs;
use codoc_store::{ClientInfo, Id, Store};
use codoc_types::{ChangePack, DocumentKey};
use std::sync::Arc;
use tokio::sync::broadcast;

/// What a sync request intends for the client's attachment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SyncMode {
    /// Plain sync of an already attached document.
    PushPull,
    /// Attach the document, creating it on first access.
    Attach,
    /// Sync one last time and detach.
    Detach,
}

/// The document synchronization server.
///
/// One instance serves many concurrent clients; per-document locks
/// serialize writers while requests for different documents proceed in
/// parallel. The RPC transport in front of this type maps wire messages
/// onto the methods below and error kinds onto wire statuses.
pub struct SyncServer {
    backend: Arc<Backend>,
}

impl SyncServer {
    /// Creates a server over the given store and materializer.
    pub fn new(
        config: Config,
        store: Arc<dyn Store>,
        materializer: Arc<dyn Materializer>,
    ) -> SyncResult<Self> {
        Ok(Self {
            backend: Arc::new(Backend::new(config, store, materializer)?),
        })
    }

    /// Activates the client with the given key, creating it on first use.
    pub async fn activate_client(&self, key: &str) -> SyncResult<ClientInfo> {
        Ok(self.backend.store.activate_client(key).await?)
    }

    /// Deactivates the client with the given id.
    pub async fn deactivate_client(&self, id: Id) -> SyncResult<ClientInfo> {
        Ok(self.backend.store.deactivate_client(id).await?)
    }

    /// Attaches the client to the pack's document and runs one push-pull
    /// exchange. The document is created on first attach.
    pub async fn attach_document(
        &self,
        client_id: Id,
        pack: ChangePack,
    ) -> SyncResult<ChangePack> {
        self.sync_document(client_id, pack, SyncMode::Attach).await
    }

    /// Runs one final push-pull exchange and detaches the client from the
    /// pack's document, resetting its sequences and dropping it from the
    /// garbage collection cohort.
    pub async fn detach_document(
        &self,
        client_id: Id,
        pack: ChangePack,
    ) -> SyncResult<ChangePack> {
        self.sync_document(client_id, pack, SyncMode::Detach).await
    }

    /// Runs one push-pull exchange for an attached document.
    pub async fn push_pull(&self, client_id: Id, pack: ChangePack) -> SyncResult<ChangePack> {
        self.sync_document(client_id, pack, SyncMode::PushPull)
            .await
    }

    /// Subscribes to events for one document key.
    pub fn watch_document(&self, key: &DocumentKey) -> broadcast::Receiver<DocEvent> {
        self.backend.events.subscribe(&key.combined())
    }

    /// Signals shutdown: pending lock waits surface as cancelled and
    /// background snapshot jobs stop.
    pub fn shutdown(&self) {
        self.backend.shutdown();
    }

    async fn sync_document(
        &self,
        client_id: Id,
        pack: ChangePack,
        mode: SyncMode,
    ) -> SyncResult<ChangePack> {
        let mut client_info = self.backend.store.find_client(client_id).await?;
        client_info.ensure_activated()?;

        let doc_info = self
            .backend
            .store
            .find_doc(client_info.id, &pack.document_key, mode == SyncMode::Attach)
            .await?;

        match mode {
            SyncMode::Attach => {
                if !client_info.is_attached(doc_info.id) {
                    client_info.attach_document(doc_info.id)?;
                }
            }
            SyncMode::Detach => client_info.detach_document(doc_info.id)?,
            SyncMode::PushPull => client_info.ensure_attached(doc_info.id)?,
        }

        let response = packs::push_pull(&self.backend, &mut client_info, doc_info, &pack).await?;
        Ok(response.into_change_pack())
    }
}
