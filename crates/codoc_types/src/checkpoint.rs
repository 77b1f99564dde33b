//! Sync progress markers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A client's view of its sync progress for one document.
///
/// `server_seq` is the highest server sequence the client has received;
/// `client_seq` is the highest client sequence the server has accepted from
/// it. Both components only ever advance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Highest server sequence received by the client.
    pub server_seq: u64,
    /// Highest client sequence acknowledged by the server.
    pub client_seq: u32,
}

impl Checkpoint {
    /// Creates a checkpoint.
    #[must_use]
    pub const fn new(server_seq: u64, client_seq: u32) -> Self {
        Self {
            server_seq,
            client_seq,
        }
    }

    /// Returns the initial checkpoint `(0, 0)`.
    #[must_use]
    pub const fn initial() -> Self {
        Self::new(0, 0)
    }

    /// Returns a checkpoint with the given server sequence and the same
    /// client sequence.
    ///
    /// Used when the server advances a client's view after a pull.
    #[must_use]
    pub const fn next_server_seq(&self, server_seq: u64) -> Self {
        Self::new(server_seq, self.client_seq)
    }

    /// Returns a checkpoint with the client sequence bumped by `inc`.
    ///
    /// Used after a successful push of `inc` changes.
    #[must_use]
    pub const fn increase_client_seq(&self, inc: u32) -> Self {
        Self::new(self.server_seq, self.client_seq + inc)
    }

    /// Returns the component-wise maximum of two checkpoints.
    #[must_use]
    pub fn forward(&self, other: &Checkpoint) -> Self {
        Self::new(
            self.server_seq.max(other.server_seq),
            self.client_seq.max(other.client_seq),
        )
    }

    /// Returns true if this is the initial checkpoint.
    #[must_use]
    pub fn is_initial(&self) -> bool {
        self.server_seq == 0 && self.client_seq == 0
    }
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "serverSeq={}, clientSeq={}",
            self.server_seq, self.client_seq
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_is_zero() {
        let cp = Checkpoint::initial();
        assert!(cp.is_initial());
        assert_eq!(cp, Checkpoint::new(0, 0));
    }

    #[test]
    fn next_server_seq_keeps_client_seq() {
        let cp = Checkpoint::new(3, 7);
        assert_eq!(cp.next_server_seq(10), Checkpoint::new(10, 7));
    }

    #[test]
    fn increase_client_seq_keeps_server_seq() {
        let cp = Checkpoint::new(3, 7);
        assert_eq!(cp.increase_client_seq(2), Checkpoint::new(3, 9));
        assert_eq!(cp.increase_client_seq(0), cp);
    }

    #[test]
    fn forward_takes_componentwise_max() {
        let a = Checkpoint::new(5, 2);
        let b = Checkpoint::new(3, 9);
        let merged = a.forward(&b);
        assert_eq!(merged, Checkpoint::new(5, 9));
        assert_eq!(merged, b.forward(&a));
    }

    #[test]
    fn display() {
        let cp = Checkpoint::new(4, 1);
        assert_eq!(cp.to_string(), "serverSeq=4, clientSeq=1");
    }
}
