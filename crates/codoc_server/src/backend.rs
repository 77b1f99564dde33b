//! Long-lived collaborators behind the sync pipeline.

use crate::config::Config;
use crate::error::SyncResult;
use crate::event::EventBus;
use crate::lock::LockManager;
use crate::materializer::Materializer;
use codoc_store::{Id, Store};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Builds the push-pull lock key for a document.
#[must_use]
pub fn push_pull_key(doc_id: Id) -> String {
    format!("push-pull:{doc_id}")
}

/// Builds the snapshot lock key for a document.
#[must_use]
pub fn snapshot_key(doc_id: Id) -> String {
    format!("snapshot:{doc_id}")
}

/// The collaborators every sync request runs against.
///
/// All of them are long-lived and passed explicitly; nothing here is
/// global. The backend is shared across request tasks behind an `Arc`.
pub struct Backend {
    /// Server configuration.
    pub config: Config,
    /// Persistence backend.
    pub store: Arc<dyn Store>,
    /// Per-document lock manager.
    pub lockers: LockManager,
    /// Document event fan-out.
    pub events: EventBus,
    /// Snapshot materialization capability.
    pub materializer: Arc<dyn Materializer>,
    shutdown: CancellationToken,
}

impl Backend {
    /// Creates a backend after validating the configuration.
    pub fn new(
        config: Config,
        store: Arc<dyn Store>,
        materializer: Arc<dyn Materializer>,
    ) -> SyncResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            store,
            lockers: LockManager::new(),
            events: EventBus::new(),
            materializer,
            shutdown: CancellationToken::new(),
        })
    }

    /// Returns the shutdown token request tasks race their waits against.
    #[must_use]
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    /// Signals shutdown: pending lock waits surface as cancelled and
    /// background snapshot jobs stop.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}
