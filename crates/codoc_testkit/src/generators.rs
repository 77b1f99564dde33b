//! Property-based generators for the protocol value types.

use codoc_types::{ActorId, Change, ChangeId, Checkpoint, Ticket};
use proptest::prelude::*;

/// Strategy for arbitrary actor ids.
pub fn actor_id_strategy() -> impl Strategy<Value = ActorId> {
    prop::array::uniform12(any::<u8>()).prop_map(ActorId::from_bytes)
}

/// Strategy for arbitrary tickets.
pub fn ticket_strategy() -> impl Strategy<Value = Ticket> {
    (any::<u64>(), any::<u32>(), actor_id_strategy())
        .prop_map(|(lamport, delimiter, actor)| Ticket::new(lamport, delimiter, actor))
}

/// Strategy for arbitrary checkpoints.
pub fn checkpoint_strategy() -> impl Strategy<Value = Checkpoint> {
    (any::<u64>(), any::<u32>()).prop_map(|(server_seq, client_seq)| {
        Checkpoint::new(server_seq, client_seq)
    })
}

/// Strategy for opaque operation payloads.
pub fn operations_strategy() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(prop::collection::vec(any::<u8>(), 0..64), 1..4)
}

/// Strategy for a valid ordered batch of changes from one actor.
///
/// Client sequences increase strictly and lamports never move backwards,
/// the shape the push stage accepts.
pub fn change_batch_strategy() -> impl Strategy<Value = Vec<Change>> {
    let pushing_actor = actor_id_strategy().prop_map(|actor| {
        // The push stage rejects the zero actor; pin one bit.
        let mut bytes = *actor.as_bytes();
        bytes[0] |= 1;
        ActorId::from_bytes(bytes)
    });
    (
        pushing_actor,
        1u32..100,
        1u64..100,
        prop::collection::vec((1u32..5, 0u64..5, operations_strategy()), 0..8),
    )
        .prop_map(|(actor, start_seq, start_lamport, steps)| {
            let mut client_seq = start_seq;
            let mut lamport = start_lamport;
            steps
                .into_iter()
                .map(|(seq_step, lamport_step, operations)| {
                    let change = Change::new(
                        ChangeId::new(client_seq, lamport, actor),
                        None,
                        operations,
                    );
                    client_seq += seq_step;
                    lamport += lamport_step;
                    change
                })
                .collect()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;

    proptest! {
        #[test]
        fn ticket_order_is_lexicographic(a in ticket_strategy(), b in ticket_strategy()) {
            let expected = (a.lamport, a.delimiter, *a.actor.as_bytes())
                .cmp(&(b.lamport, b.delimiter, *b.actor.as_bytes()));
            prop_assert_eq!(a.cmp(&b), expected);
        }

        #[test]
        fn initial_ticket_is_the_minimum(t in ticket_strategy()) {
            prop_assert!(Ticket::initial() <= t);
        }

        #[test]
        fn ticket_of_change_bounds_its_lamport_step(t in ticket_strategy()) {
            let cap = Ticket::of_change(t.lamport, t.actor);
            prop_assert!(t <= cap);
        }

        #[test]
        fn checkpoint_forward_is_an_upper_bound(
            a in checkpoint_strategy(),
            b in checkpoint_strategy(),
        ) {
            let merged = a.forward(&b);
            prop_assert!(merged.server_seq >= a.server_seq);
            prop_assert!(merged.server_seq >= b.server_seq);
            prop_assert!(merged.client_seq >= a.client_seq);
            prop_assert!(merged.client_seq >= b.client_seq);
            prop_assert_eq!(merged, b.forward(&a));
            prop_assert_eq!(merged, merged.forward(&a));
        }

        #[test]
        fn checkpoint_operations_never_rewind(
            cp in checkpoint_strategy(),
            server_seq in any::<u64>(),
            inc in 0u32..1000,
        ) {
            let advanced = cp.next_server_seq(cp.server_seq.max(server_seq));
            prop_assert!(advanced.server_seq >= cp.server_seq);
            prop_assert_eq!(advanced.client_seq, cp.client_seq);

            let bumped = cp.increase_client_seq(inc.min(u32::MAX - cp.client_seq));
            prop_assert!(bumped.client_seq >= cp.client_seq);
            prop_assert_eq!(bumped.server_seq, cp.server_seq);
        }

        #[test]
        fn generated_batches_satisfy_push_validation(batch in change_batch_strategy()) {
            for window in batch.windows(2) {
                prop_assert!(window[0].id.client_seq < window[1].id.client_seq);
                prop_assert!(window[0].id.lamport <= window[1].id.lamport);
            }
            for change in &batch {
                prop_assert!(!change.id.actor.is_initial());
            }
        }
    }

    #[test]
    fn ticket_order_ties_break_on_actor() {
        let a = Ticket::new(3, 7, ActorId::from_bytes([0; 12]));
        let b = Ticket::new(3, 7, ActorId::from_bytes([1; 12]));
        assert_eq!(a.cmp(&b), Ordering::Less);
    }
}
