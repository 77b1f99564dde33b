//! Logical timestamps.

use crate::actor::ActorId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Delimiter marking the end of a lamport step.
///
/// A ticket built from a persisted change uses this delimiter so it compares
/// after every ticket the change itself produced at that lamport.
pub const MAX_DELIMITER: u32 = u32::MAX;

/// A logical timestamp.
///
/// Tickets totally order edits across actors. The order is lexicographic on
/// `(lamport, delimiter, actor)`; the derived `Ord` relies on that field
/// order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Ticket {
    /// Lamport clock value.
    pub lamport: u64,
    /// Disambiguates tickets created within one lamport step.
    pub delimiter: u32,
    /// The actor that created the ticket.
    pub actor: ActorId,
}

impl Ticket {
    /// Creates a ticket.
    #[must_use]
    pub const fn new(lamport: u64, delimiter: u32, actor: ActorId) -> Self {
        Self {
            lamport,
            delimiter,
            actor,
        }
    }

    /// Returns the zero ticket, ordered before every other ticket.
    ///
    /// Returned as the minimum synced ticket when no attached client exists.
    #[must_use]
    pub const fn initial() -> Self {
        Self::new(0, 0, ActorId::initial())
    }

    /// Builds the ticket representing the end of a persisted change's
    /// lamport step.
    #[must_use]
    pub const fn of_change(lamport: u64, actor: ActorId) -> Self {
        Self::new(lamport, MAX_DELIMITER, actor)
    }

    /// Returns true if this is the zero ticket.
    #[must_use]
    pub fn is_initial(&self) -> bool {
        *self == Self::initial()
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.lamport, self.delimiter, self.actor)
    }
}
