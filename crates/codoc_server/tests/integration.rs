//! End-to-end tests for the push-pull pipeline over the in-memory store.

use codoc_server::{Config, OpLogMaterializer, SyncError, SyncServer};
use codoc_store::{MemoryStore, Store};
use codoc_testkit::{doc_key, pack, ChangeBuilder};
use codoc_types::{ActorId, Change, ChangePack, Checkpoint, Ticket};
use std::sync::Arc;
use std::time::Duration;

fn new_server(config: Config) -> (Arc<SyncServer>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let server = SyncServer::new(
        config,
        Arc::clone(&store) as Arc<dyn Store>,
        Arc::new(OpLogMaterializer::new()),
    )
    .unwrap();
    (Arc::new(server), store)
}

/// Applies a pulled pack to a client replica and returns its state bytes.
fn replica_state(snapshot: &[u8], changes: &[Change]) -> Vec<u8> {
    use codoc_server::{MaterializedDoc as _, Materializer as _};
    let materializer = OpLogMaterializer::new();
    let mut doc = materializer.open(snapshot).unwrap();
    for change in changes {
        doc.apply(change).unwrap();
    }
    doc.serialize().unwrap()
}

#[tokio::test]
async fn fresh_client_on_an_empty_document() {
    let (server, _store) = new_server(Config::default());

    let a = server.activate_client("client-a").await.unwrap();
    let mut edits = ChangeBuilder::new(a.id.as_actor_id());
    let changes = edits.next_n(2);
    let last_lamport = changes[1].id.lamport;

    let response = server
        .attach_document(a.id, pack(doc_key("k"), Checkpoint::initial(), changes))
        .await
        .unwrap();

    assert_eq!(response.checkpoint, Checkpoint::new(2, 2));
    assert!(response.changes.is_empty());
    assert!(response.snapshot.is_none());
    assert_eq!(
        response.min_synced_ticket,
        Some(Ticket::of_change(last_lamport, a.id.as_actor_id()))
    );
}

#[tokio::test]
async fn second_client_pulls_the_first_ones_changes() {
    let (server, _store) = new_server(Config::default());

    let a = server.activate_client("client-a").await.unwrap();
    let mut edits = ChangeBuilder::new(a.id.as_actor_id());
    let pushed = edits.next_n(2);
    server
        .attach_document(a.id, pack(doc_key("k"), Checkpoint::initial(), pushed.clone()))
        .await
        .unwrap();

    let b = server.activate_client("client-b").await.unwrap();
    let response = server
        .attach_document(b.id, pack(doc_key("k"), Checkpoint::initial(), vec![]))
        .await
        .unwrap();

    assert_eq!(response.checkpoint, Checkpoint::new(2, 0));
    assert!(response.snapshot.is_none());
    assert_eq!(response.changes.len(), 2);
    assert_eq!(response.changes[0].id, pushed[0].id);
    assert_eq!(response.changes[1].id, pushed[1].id);
    let seqs: Vec<u64> = response.changes.iter().map(|c| c.server_seq).collect();
    assert_eq!(seqs, vec![1, 2]);

    // Both clients acknowledged sequence 2, so the collectable horizon is
    // the last change's ticket.
    assert_eq!(
        response.min_synced_ticket,
        Some(Ticket::of_change(pushed[1].id.lamport, a.id.as_actor_id()))
    );
}

#[tokio::test]
async fn far_behind_client_gets_a_snapshot() {
    let (server, _store) = new_server(Config::new().with_snapshot_threshold(2));

    let a = server.activate_client("client-a").await.unwrap();
    let mut edits = ChangeBuilder::new(a.id.as_actor_id());
    let pushed = edits.next_n(3);
    server
        .attach_document(a.id, pack(doc_key("k"), Checkpoint::initial(), pushed.clone()))
        .await
        .unwrap();

    let b = server.activate_client("client-b").await.unwrap();
    let response = server
        .attach_document(b.id, pack(doc_key("k"), Checkpoint::initial(), vec![]))
        .await
        .unwrap();

    assert_eq!(response.checkpoint, Checkpoint::new(3, 0));
    assert!(response.changes.is_empty());
    let snapshot = response.snapshot.expect("expected a snapshot response");
    assert!(!snapshot.is_empty());

    // The snapshot must equal the state a replica reaches by applying the
    // changes themselves.
    assert_eq!(replica_state(&snapshot, &[]), replica_state(&[], &pushed));
}

#[tokio::test]
async fn concurrent_pushes_are_serialized() {
    let (server, store) = new_server(Config::default());

    let a = server.activate_client("client-a").await.unwrap();
    let b = server.activate_client("client-b").await.unwrap();
    for client in [&a, &b] {
        server
            .attach_document(client.id, pack(doc_key("k"), Checkpoint::initial(), vec![]))
            .await
            .unwrap();
    }

    let mut handles = Vec::new();
    for client in [a.clone(), b.clone()] {
        let server = Arc::clone(&server);
        handles.push(tokio::spawn(async move {
            let mut edits = ChangeBuilder::new(client.id.as_actor_id());
            server
                .push_pull(
                    client.id,
                    pack(doc_key("k"), Checkpoint::initial(), edits.next_n(5)),
                )
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // The union of both pushes is densely sequenced.
    let doc = store.find_doc(a.id, &doc_key("k"), false).await.unwrap();
    assert_eq!(doc.server_seq, 10);
    let seqs: Vec<u64> = store
        .find_changes(doc.id, 1, 10)
        .await
        .unwrap()
        .iter()
        .map(|c| c.server_seq)
        .collect();
    assert_eq!(seqs, (1..=10).collect::<Vec<u64>>());
}

#[tokio::test]
async fn future_checkpoint_is_rejected_without_side_effects() {
    let (server, store) = new_server(Config::default());

    let a = server.activate_client("client-a").await.unwrap();
    let mut edits = ChangeBuilder::new(a.id.as_actor_id());
    server
        .attach_document(a.id, pack(doc_key("k"), Checkpoint::initial(), edits.next_n(5)))
        .await
        .unwrap();

    let err = server
        .push_pull(a.id, pack(doc_key("k"), Checkpoint::new(9999, 5), vec![]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SyncError::InvalidServerSeq {
            initial: 5,
            requested: 9999,
        }
    ));

    let doc = store.find_doc(a.id, &doc_key("k"), false).await.unwrap();
    assert_eq!(doc.server_seq, 5);
    assert_eq!(store.change_count(doc.id), 5);
}

#[tokio::test]
async fn detach_shrinks_the_collection_cohort() {
    let (server, store) = new_server(Config::default());

    let a = server.activate_client("client-a").await.unwrap();
    let b = server.activate_client("client-b").await.unwrap();
    let mut edits = ChangeBuilder::new(a.id.as_actor_id());

    let first = edits.next_n(2);
    server
        .attach_document(a.id, pack(doc_key("k"), Checkpoint::initial(), first.clone()))
        .await
        .unwrap();
    server
        .attach_document(b.id, pack(doc_key("k"), Checkpoint::initial(), vec![]))
        .await
        .unwrap();

    // A moves ahead; B is now the minimum at sequence 2.
    let third = edits.next_n(1);
    let response = server
        .push_pull(a.id, pack(doc_key("k"), Checkpoint::new(2, 2), third.clone()))
        .await
        .unwrap();
    assert_eq!(
        response.min_synced_ticket,
        Some(Ticket::of_change(first[1].id.lamport, a.id.as_actor_id()))
    );

    // B detaches: its row disappears and A alone defines the horizon.
    let response = server
        .detach_document(b.id, pack(doc_key("k"), Checkpoint::new(2, 0), vec![]))
        .await
        .unwrap();
    assert_eq!(
        response.min_synced_ticket,
        Some(Ticket::of_change(third[0].id.lamport, a.id.as_actor_id()))
    );

    let stored = store.find_client(b.id).await.unwrap();
    let doc = store.find_doc(a.id, &doc_key("k"), false).await.unwrap();
    let entry = stored.documents.get(&doc.id).unwrap();
    assert_eq!(entry.server_seq, 0);
    assert_eq!(entry.client_seq, 0);

    // B's synced-seq row is gone; only A remains in the cohort.
    let rows = store.synced_seqs(doc.id);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].client_id, a.id);
}

#[tokio::test]
async fn threshold_boundary_picks_the_response_form() {
    let (server, _store) = new_server(Config::new().with_snapshot_threshold(3));

    let a = server.activate_client("client-a").await.unwrap();
    let b = server.activate_client("client-b").await.unwrap();
    let mut edits = ChangeBuilder::new(a.id.as_actor_id());

    server
        .attach_document(a.id, pack(doc_key("k"), Checkpoint::initial(), edits.next_n(2)))
        .await
        .unwrap();

    // Distance 2 == threshold - 1: plain changes.
    let response = server
        .attach_document(b.id, pack(doc_key("k"), Checkpoint::initial(), vec![]))
        .await
        .unwrap();
    assert_eq!(response.changes.len(), 2);
    assert!(response.snapshot.is_none());

    // One more change; distance from a zero checkpoint is now exactly the
    // threshold: snapshot.
    server
        .push_pull(a.id, pack(doc_key("k"), Checkpoint::new(2, 2), edits.next_n(1)))
        .await
        .unwrap();
    let response = server
        .push_pull(b.id, pack(doc_key("k"), Checkpoint::initial(), vec![]))
        .await
        .unwrap();
    assert!(response.changes.is_empty());
    assert!(response.snapshot.is_some());
}

#[tokio::test]
async fn caught_up_client_gets_an_empty_changes_response() {
    let (server, _store) = new_server(Config::new().with_snapshot_threshold(1));

    let a = server.activate_client("client-a").await.unwrap();
    let mut edits = ChangeBuilder::new(a.id.as_actor_id());
    let response = server
        .attach_document(a.id, pack(doc_key("k"), Checkpoint::initial(), edits.next_n(4)))
        .await
        .unwrap();

    // Equal sequences: distance zero stays below any threshold, so this is
    // a changes response, not a snapshot.
    let response = server
        .push_pull(a.id, pack(doc_key("k"), response.checkpoint, vec![]))
        .await
        .unwrap();
    assert!(response.changes.is_empty());
    assert!(response.snapshot.is_none());
    assert_eq!(response.checkpoint, Checkpoint::new(4, 4));
}

#[tokio::test]
async fn empty_push_pull_is_idempotent() {
    let (server, _store) = new_server(Config::default());

    let a = server.activate_client("client-a").await.unwrap();
    let mut edits = ChangeBuilder::new(a.id.as_actor_id());
    server
        .attach_document(a.id, pack(doc_key("k"), Checkpoint::initial(), edits.next_n(3)))
        .await
        .unwrap();

    let b = server.activate_client("client-b").await.unwrap();
    server
        .attach_document(b.id, pack(doc_key("k"), Checkpoint::initial(), vec![]))
        .await
        .unwrap();

    let request = || pack(doc_key("k"), Checkpoint::new(1, 0), vec![]);
    let first = server.push_pull(b.id, request()).await.unwrap();
    let second = server.push_pull(b.id, request()).await.unwrap();

    assert_eq!(first.checkpoint, second.checkpoint);
    assert_eq!(first.changes, second.changes);
    assert_eq!(first.snapshot, second.snapshot);
    assert_eq!(first.min_synced_ticket, second.min_synced_ticket);
}

#[tokio::test]
async fn snapshot_and_changes_responses_converge() {
    // The same edit history served through both response forms must land
    // replicas on identical bytes.
    let (via_changes, _) = new_server(Config::new().with_snapshot_threshold(1000));
    let (via_snapshot, _) = new_server(Config::new().with_snapshot_threshold(1));

    let mut responses: Vec<ChangePack> = Vec::new();
    for server in [&via_changes, &via_snapshot] {
        let a = server.activate_client("client-a").await.unwrap();
        let mut edits = ChangeBuilder::new(a.id.as_actor_id());
        server
            .attach_document(a.id, pack(doc_key("k"), Checkpoint::initial(), edits.next_n(4)))
            .await
            .unwrap();

        let b = server.activate_client("client-b").await.unwrap();
        let response = server
            .attach_document(b.id, pack(doc_key("k"), Checkpoint::initial(), vec![]))
            .await
            .unwrap();
        responses.push(response);
    }

    assert!(responses[0].snapshot.is_none());
    assert!(responses[1].snapshot.is_some());
    let from_changes = replica_state(&[], &responses[0].changes);
    let from_snapshot = replica_state(responses[1].snapshot.as_deref().unwrap(), &[]);
    assert_eq!(from_changes, from_snapshot);
}

#[tokio::test]
async fn pulled_changes_replay_to_the_server_state() {
    let (server, store) = new_server(Config::default());

    let a = server.activate_client("client-a").await.unwrap();
    let b = server.activate_client("client-b").await.unwrap();
    let mut a_edits = ChangeBuilder::new(a.id.as_actor_id());
    let mut b_edits = ChangeBuilder::new(b.id.as_actor_id());

    server
        .attach_document(a.id, pack(doc_key("k"), Checkpoint::initial(), a_edits.next_n(3)))
        .await
        .unwrap();
    server
        .attach_document(b.id, pack(doc_key("k"), Checkpoint::initial(), vec![]))
        .await
        .unwrap();
    b_edits.observe(3);
    server
        .push_pull(b.id, pack(doc_key("k"), Checkpoint::new(3, 0), b_edits.next_n(2)))
        .await
        .unwrap();

    // A fresh replica applies everything a full pull returns.
    let c = server.activate_client("client-c").await.unwrap();
    let response = server
        .attach_document(c.id, pack(doc_key("k"), Checkpoint::initial(), vec![]))
        .await
        .unwrap();
    let replica = replica_state(&[], &response.changes);

    // The server's own materialization over the full log must agree.
    let doc = store.find_doc(a.id, &doc_key("k"), false).await.unwrap();
    let log = store.find_changes(doc.id, 1, doc.server_seq).await.unwrap();
    assert_eq!(replica, replica_state(&[], &log));
}

#[tokio::test]
async fn interval_reached_triggers_a_background_snapshot() {
    let (server, store) = new_server(
        Config::new()
            .with_snapshot_interval(5)
            .with_snapshot_threshold(1000),
    );

    let a = server.activate_client("client-a").await.unwrap();
    let mut edits = ChangeBuilder::new(a.id.as_actor_id());
    server
        .attach_document(a.id, pack(doc_key("k"), Checkpoint::initial(), edits.next_n(5)))
        .await
        .unwrap();

    let doc = store.find_doc(a.id, &doc_key("k"), false).await.unwrap();
    let mut waited = Duration::ZERO;
    while store.snapshot_count(doc.id) == 0 && waited < Duration::from_secs(2) {
        let step = Duration::from_millis(10);
        tokio::time::sleep(step).await;
        waited += step;
    }

    let snapshot = store
        .find_last_snapshot(doc.id)
        .await
        .unwrap()
        .expect("snapshot job did not run");
    assert_eq!(snapshot.server_seq, 5);

    // The stored bytes are the materialization of the full log.
    let log = store.find_changes(doc.id, 1, 5).await.unwrap();
    assert_eq!(snapshot.snapshot, replica_state(&[], &log));
}

#[tokio::test]
async fn shutdown_cancels_new_requests() {
    let (server, _store) = new_server(Config::default());

    let a = server.activate_client("client-a").await.unwrap();
    server
        .attach_document(a.id, pack(doc_key("k"), Checkpoint::initial(), vec![]))
        .await
        .unwrap();

    server.shutdown();
    let err = server
        .push_pull(a.id, pack(doc_key("k"), Checkpoint::initial(), vec![]))
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Cancelled));
}

#[tokio::test]
async fn invalid_change_batches_are_rejected() {
    let (server, store) = new_server(Config::default());

    let a = server.activate_client("client-a").await.unwrap();
    server
        .attach_document(a.id, pack(doc_key("k"), Checkpoint::initial(), vec![]))
        .await
        .unwrap();

    // The zero actor cannot author changes.
    let mut forged = ChangeBuilder::new(ActorId::initial());
    let err = server
        .push_pull(a.id, pack(doc_key("k"), Checkpoint::initial(), forged.next_n(1)))
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::InvalidChange(_)));

    let doc = store.find_doc(a.id, &doc_key("k"), false).await.unwrap();
    assert_eq!(store.change_count(doc.id), 0);
}
