//! Snapshot stage: background materialization of document state.

use crate::backend::{snapshot_key, Backend};
use crate::config::Config;
use crate::error::SyncResult;
use crate::packs::materialize;
use codoc_store::DocInfo;
use std::sync::Arc;
use tracing::{debug, error};

/// Returns true when a fresh snapshot is due after a push that brought the
/// document to `server_seq`.
pub(crate) fn snapshot_due(config: &Config, server_seq: u64) -> bool {
    server_seq > 0 && server_seq % config.snapshot_interval == 0
}

/// Spawns snapshot creation detached from the request that triggered it.
///
/// The job runs under its own cancellation scope derived from the backend
/// shutdown token; failures are logged, never surfaced to the client.
pub(crate) fn spawn_snapshot(backend: Arc<Backend>, doc_info: DocInfo) {
    let token = backend.shutdown_token().child_token();
    tokio::spawn(async move {
        tokio::select! {
            result = create_snapshot(&backend, &doc_info) => {
                if let Err(err) = result {
                    error!(
                        "SNAPSHOT: creation failed for '{}': {err}",
                        doc_info.key,
                    );
                }
            }
            () = token.cancelled() => {
                debug!("SNAPSHOT: cancelled for '{}'", doc_info.key);
            }
        }
    });
}

/// Materializes the document at `doc_info.server_seq` and stores it.
///
/// Skips silently when another task holds the snapshot lock or when the
/// log has not grown a full interval past the last snapshot.
pub(crate) async fn create_snapshot(backend: &Backend, doc_info: &DocInfo) -> SyncResult<()> {
    let Ok(_guard) = backend.lockers.try_lock(&snapshot_key(doc_info.id)) else {
        debug!(
            "SNAPSHOT: '{}' is already being snapshotted, skipping",
            doc_info.key,
        );
        return Ok(());
    };

    let last = backend.store.find_last_snapshot(doc_info.id).await?;
    let (snapshot_seq, snapshot) = match last {
        Some(info) => (info.server_seq, info.snapshot),
        None => (0, Vec::new()),
    };
    // A stale job may observe a snapshot newer than its own target; the
    // saturating distance turns that into a skip.
    if doc_info.server_seq.saturating_sub(snapshot_seq) < backend.config.snapshot_interval {
        return Ok(());
    }

    let rebuilt = materialize(
        backend,
        doc_info.id,
        snapshot_seq + 1,
        doc_info.server_seq,
        &snapshot,
    )
    .await?;

    backend
        .store
        .create_snapshot(doc_info.id, doc_info.server_seq, rebuilt)
        .await?;

    debug!(
        "SNAPSHOT: stored '{}' at serverSeq={}",
        doc_info.key, doc_info.server_seq,
    );
    Ok(())
}
