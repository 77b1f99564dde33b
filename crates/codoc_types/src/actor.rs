//! Actor identity.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of raw bytes in an actor id (24 hex characters on the wire).
pub const ACTOR_ID_LEN: usize = 12;

/// Errors from parsing an actor id.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActorIdError {
    /// The hex string has the wrong length.
    #[error("invalid actor id length: expected {expected} hex chars, got {actual}")]
    InvalidLength {
        /// Expected number of hex characters.
        expected: usize,
        /// Actual number of hex characters.
        actual: usize,
    },

    /// The string contains a non-hex character.
    #[error("invalid hex digit {digit:?} in actor id")]
    InvalidDigit {
        /// The offending character.
        digit: char,
    },
}

/// Identity of an editing actor.
///
/// Actor ids are 12-byte values rendered as 24 lowercase hex characters on
/// the wire. The server hands one to each activated client; every change a
/// client produces carries it.
///
/// The zero value (the *initial* actor) is reserved: it appears in
/// [`Ticket::initial`](crate::Ticket::initial) and is rejected on pushed
/// changes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActorId([u8; ACTOR_ID_LEN]);

impl ActorId {
    /// Creates an actor id from raw bytes.
    #[inline]
    #[must_use]
    pub const fn from_bytes(bytes: [u8; ACTOR_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Returns the zero actor id.
    #[must_use]
    pub const fn initial() -> Self {
        Self([0; ACTOR_ID_LEN])
    }

    /// Creates a new random actor id.
    #[must_use]
    pub fn random() -> Self {
        Self(rand::random())
    }

    /// Parses an actor id from its 24-character hex form.
    pub fn from_hex(hex: &str) -> Result<Self, ActorIdError> {
        if hex.len() != ACTOR_ID_LEN * 2 {
            return Err(ActorIdError::InvalidLength {
                expected: ACTOR_ID_LEN * 2,
                actual: hex.len(),
            });
        }

        let mut bytes = [0u8; ACTOR_ID_LEN];
        let raw = hex.as_bytes();
        for (i, byte) in bytes.iter_mut().enumerate() {
            let hi = hex_val(raw[i * 2])?;
            let lo = hex_val(raw[i * 2 + 1])?;
            *byte = (hi << 4) | lo;
        }
        Ok(Self(bytes))
    }

    /// Returns the 24-character lowercase hex form.
    #[must_use]
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(ACTOR_ID_LEN * 2);
        for byte in &self.0 {
            out.push(char::from_digit(u32::from(byte >> 4), 16).unwrap_or('0'));
            out.push(char::from_digit(u32::from(byte & 0x0f), 16).unwrap_or('0'));
        }
        out
    }

    /// Returns the raw bytes.
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; ACTOR_ID_LEN] {
        &self.0
    }

    /// Returns true if this is the zero actor id.
    #[must_use]
    pub fn is_initial(&self) -> bool {
        self.0 == [0; ACTOR_ID_LEN]
    }
}

fn hex_val(digit: u8) -> Result<u8, ActorIdError> {
    match digit {
        b'0'..=b'9' => Ok(digit - b'0'),
        b'a'..=b'f' => Ok(digit - b'a' + 10),
        b'A'..=b'F' => Ok(digit - b'A' + 10),
        other => Err(ActorIdError::InvalidDigit {
            digit: other as char,
        }),
    }
}

impl fmt::Debug for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActorId({})", self.to_hex())
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ActorId {
    type Err = ActorIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; ACTOR_ID_LEN]> for ActorId {
    fn from(bytes: [u8; ACTOR_ID_LEN]) -> Self {
        Self(bytes)
    }
}

impl Serialize for ActorId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ActorId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct HexVisitor;

        impl Visitor<'_> for HexVisitor {
            type Value = ActorId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a 24-character hex actor id")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<ActorId, E> {
                ActorId::from_hex(v).map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_str(HexVisitor)
    }
}
