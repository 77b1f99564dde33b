//! Push stage: persist a client's changes under the document lock.

use crate::backend::Backend;
use crate::error::{SyncError, SyncResult};
use codoc_store::{ClientInfo, DocInfo};
use codoc_types::{Change, ChangePack, Checkpoint};
use tracing::info;

/// Persists the request pack's changes and advances the document's server
/// sequence.
///
/// `initial_server_seq` is the document's sequence read under the
/// push-pull lock; the store's compare-and-set against it turns any
/// writer that slipped past the lock into a hard failure. Returns the
/// pushed checkpoint, the request checkpoint with its client sequence
/// advanced by the number of accepted changes.
pub(crate) async fn push_changes(
    backend: &Backend,
    client_info: &ClientInfo,
    doc_info: &mut DocInfo,
    request_pack: &ChangePack,
    initial_server_seq: u64,
) -> SyncResult<Checkpoint> {
    if !request_pack.has_changes() {
        return Ok(request_pack.checkpoint);
    }

    validate_changes(&request_pack.changes)?;

    let mut changes = request_pack.changes.clone();
    for change in &mut changes {
        change.server_seq = doc_info.increase_server_seq();
    }

    backend
        .store
        .store_changes(doc_info, initial_server_seq, &changes)
        .await?;

    info!(
        "PUSH: '{}' pushes {} changes into '{}'",
        client_info.id,
        changes.len(),
        doc_info.key,
    );

    Ok(request_pack
        .checkpoint
        .increase_client_seq(changes.len() as u32))
}

/// Rejects packs the server can see are malformed without decoding any
/// operation payloads.
fn validate_changes(changes: &[Change]) -> SyncResult<()> {
    let mut previous: Option<&Change> = None;
    for change in changes {
        if change.id.actor.is_initial() {
            return Err(SyncError::InvalidChange(format!(
                "change {} carries the zero actor id",
                change.id
            )));
        }
        if let Some(prev) = previous {
            if change.id.client_seq <= prev.id.client_seq {
                return Err(SyncError::InvalidChange(format!(
                    "client seq {} does not increase past {}",
                    change.id.client_seq, prev.id.client_seq
                )));
            }
            if change.id.lamport < prev.id.lamport {
                return Err(SyncError::InvalidChange(format!(
                    "lamport {} moves backwards from {}",
                    change.id.lamport, prev.id.lamport
                )));
            }
        }
        previous = Some(change);
    }
    Ok(())
}
