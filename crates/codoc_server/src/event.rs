//! Document event fan-out.

use codoc_types::ActorId;
use parking_lot::RwLock;
use std::collections::HashMap;
use tokio::sync::broadcast;

/// Default per-key event buffer. Slow watchers past this lag miss events
/// and recover by polling push-pull.
const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Kind of a document event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocEventKind {
    /// A client's lifecycle status changed.
    StatusChanged,
    /// A watched document received new changes.
    DocumentsChanged,
    /// The set of peers editing a document changed.
    PeersChanged,
    /// A watch stream connected or disconnected.
    StreamConnectionStatusChanged,
    /// A sync round for a document finished.
    DocumentSyncResult,
}

impl DocEventKind {
    /// Returns the wire name of the kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            DocEventKind::StatusChanged => "status-changed",
            DocEventKind::DocumentsChanged => "documents-changed",
            DocEventKind::PeersChanged => "peers-changed",
            DocEventKind::StreamConnectionStatusChanged => "stream-connection-status-changed",
            DocEventKind::DocumentSyncResult => "document-sync-result",
        }
    }
}

/// An event delivered to watchers of a document key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocEvent {
    /// What happened.
    pub kind: DocEventKind,
    /// Combined key of the document.
    pub document_key: String,
    /// The actor whose request produced the event.
    pub actor: ActorId,
}

/// In-process publish/subscribe surface for document events.
///
/// Delivery is best-effort and at-most-once: publishing never blocks, and a
/// receiver that lags past the channel capacity drops the oldest events.
#[derive(Debug)]
pub struct EventBus {
    channels: RwLock<HashMap<String, broadcast::Sender<DocEvent>>>,
    capacity: usize,
}

impl EventBus {
    /// Creates an event bus with the default buffer capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates an event bus with the given per-key buffer capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            capacity,
        }
    }

    /// Subscribes to events for one document key.
    pub fn subscribe(&self, document_key: &str) -> broadcast::Receiver<DocEvent> {
        let mut channels = self.channels.write();
        channels
            .entry(document_key.to_owned())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Publishes an event to all watchers of its document key.
    ///
    /// Keys nobody watches are dropped from the table on the way.
    pub fn publish(&self, event: DocEvent) {
        let mut channels = self.channels.write();
        if let Some(tx) = channels.get(&event.document_key) {
            let key = event.document_key.clone();
            if tx.send(event).is_err() {
                channels.remove(&key);
            }
        }
    }

    /// Returns the number of live watchers for a document key.
    #[must_use]
    pub fn watcher_count(&self, document_key: &str) -> usize {
        self.channels
            .read()
            .get(document_key)
            .map_or(0, broadcast::Sender::receiver_count)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
