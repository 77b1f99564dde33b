//! Storage-level identifiers.

use codoc_types::{ActorId, ActorIdError, ACTOR_ID_LEN};
use std::fmt;
use std::str::FromStr;

/// Identifier for persisted clients and documents.
///
/// Ids share the 12-byte, 24-hex wire format of [`ActorId`]: the changes a
/// client pushes carry its store id as their actor, so the two convert
/// losslessly.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id([u8; ACTOR_ID_LEN]);

impl Id {
    /// Creates a new random id.
    #[must_use]
    pub fn new() -> Self {
        Self(rand::random())
    }

    /// Creates an id from raw bytes.
    #[inline]
    #[must_use]
    pub const fn from_bytes(bytes: [u8; ACTOR_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Parses an id from its 24-character hex form.
    pub fn from_hex(hex: &str) -> Result<Self, ActorIdError> {
        ActorId::from_hex(hex).map(|actor| Self(*actor.as_bytes()))
    }

    /// Returns the 24-character lowercase hex form.
    #[must_use]
    pub fn to_hex(&self) -> String {
        ActorId::from_bytes(self.0).to_hex()
    }

    /// Returns the raw bytes.
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; ACTOR_ID_LEN] {
        &self.0
    }

    /// Returns the actor id carried by this client's changes.
    #[must_use]
    pub const fn as_actor_id(&self) -> ActorId {
        ActorId::from_bytes(self.0)
    }
}

impl Default for Id {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.to_hex())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Id {
    type Err = ActorIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<ActorId> for Id {
    fn from(actor: ActorId) -> Self {
        Self(*actor.as_bytes())
    }
}

impl From<Id> for ActorId {
    fn from(id: Id) -> Self {
        id.as_actor_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_is_unique() {
        assert_ne!(Id::new(), Id::new());
    }

    #[test]
    fn hex_roundtrip() {
        let id = Id::from_bytes([0xab; 12]);
        assert_eq!(Id::from_hex(&id.to_hex()).unwrap(), id);
    }

    #[test]
    fn actor_conversion_is_lossless() {
        let id = Id::new();
        let actor = id.as_actor_id();
        assert_eq!(Id::from(actor), id);
        assert_eq!(actor.to_hex(), id.to_hex());
    }
}
