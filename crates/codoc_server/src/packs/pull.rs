//! Pull stage: compute the response window for a client.

use crate::backend::Backend;
use crate::error::{SyncError, SyncResult};
use crate::packs::{materialize, ServerPack};
use codoc_store::{ClientInfo, DocInfo};
use codoc_types::{ChangePack, Checkpoint};
use tracing::info;

/// Builds the pulled half of the response: either the changes the client
/// is missing or a snapshot when it is too far behind.
///
/// `initial_server_seq` is the document's sequence from before the push
/// stage, so the window `(request checkpoint, initial_server_seq]` never
/// contains the changes pushed in the same request. The pulled checkpoint
/// advances to `doc_info.server_seq`, the post-push sequence.
pub(crate) async fn pull_pack(
    backend: &Backend,
    client_info: &ClientInfo,
    doc_info: &DocInfo,
    request_pack: &ChangePack,
    pushed_cp: Checkpoint,
    initial_server_seq: u64,
) -> SyncResult<ServerPack> {
    let request_seq = request_pack.checkpoint.server_seq;
    if initial_server_seq < request_seq {
        return Err(SyncError::InvalidServerSeq {
            initial: initial_server_seq,
            requested: request_seq,
        });
    }

    if initial_server_seq - request_seq < backend.config.snapshot_threshold {
        pull_change_infos(
            backend,
            client_info,
            doc_info,
            request_pack,
            pushed_cp,
            initial_server_seq,
        )
        .await
    } else {
        pull_snapshot(
            backend,
            client_info,
            doc_info,
            request_pack,
            pushed_cp,
            initial_server_seq,
        )
        .await
    }
}

async fn pull_change_infos(
    backend: &Backend,
    client_info: &ClientInfo,
    doc_info: &DocInfo,
    request_pack: &ChangePack,
    pushed_cp: Checkpoint,
    initial_server_seq: u64,
) -> SyncResult<ServerPack> {
    let pulled = backend
        .store
        .find_change_infos(
            doc_info.id,
            request_pack.checkpoint.server_seq + 1,
            initial_server_seq,
        )
        .await?;

    let pulled_cp = pushed_cp.next_server_seq(doc_info.server_seq);

    if !pulled.is_empty() {
        info!(
            "PULL: '{}' pulls {} changes({}~{}) from '{}', cp: {}",
            client_info.id,
            pulled.len(),
            pulled[0].server_seq,
            pulled[pulled.len() - 1].server_seq,
            doc_info.key,
            pulled_cp,
        );
    }

    Ok(ServerPack::new(
        doc_info.key.clone(),
        pulled_cp,
        pulled,
        None,
    ))
}

async fn pull_snapshot(
    backend: &Backend,
    client_info: &ClientInfo,
    doc_info: &DocInfo,
    request_pack: &ChangePack,
    pushed_cp: Checkpoint,
    initial_server_seq: u64,
) -> SyncResult<ServerPack> {
    let last = backend.store.find_last_snapshot(doc_info.id).await?;
    let (snapshot_seq, snapshot) = match last {
        Some(info) => (info.server_seq, info.snapshot),
        None => (0, Vec::new()),
    };

    let pulled_cp = pushed_cp.next_server_seq(doc_info.server_seq);

    if snapshot_seq >= initial_server_seq {
        info!(
            "PULL: '{}' pulls snapshot without changes from '{}', cp: {}",
            client_info.id, doc_info.key, pulled_cp,
        );
        return Ok(ServerPack::new(
            doc_info.key.clone(),
            pulled_cp,
            Vec::new(),
            Some(snapshot),
        ));
    }

    let rebuilt = materialize(
        backend,
        doc_info.id,
        snapshot_seq + 1,
        initial_server_seq,
        &snapshot,
    )
    .await?;

    info!(
        "PULL: '{}' pulls snapshot with changes({}~{}) from '{}', cp: {}",
        client_info.id,
        request_pack.checkpoint.server_seq + 1,
        initial_server_seq,
        doc_info.key,
        pulled_cp,
    );

    Ok(ServerPack::new(
        doc_info.key.clone(),
        pulled_cp,
        Vec::new(),
        Some(rebuilt),
    ))
}
