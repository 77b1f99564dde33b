//! # codoc Types
//!
//! Wire-visible value types for the codoc synchronization protocol.
//!
//! This crate provides:
//! - Logical timestamps ([`Ticket`]) and actor identity ([`ActorId`])
//! - Sync progress markers ([`Checkpoint`])
//! - The unit of edit ([`Change`]) with opaque operation payloads
//! - The transport unit ([`ChangePack`]) exchanged between client and server

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod actor;
mod change;
mod checkpoint;
mod pack;
mod ticket;

pub use actor::{ActorId, ActorIdError, ACTOR_ID_LEN};
pub use change::{Change, ChangeId};
pub use checkpoint::Checkpoint;
pub use pack::{ChangePack, DocumentKey};
pub use ticket::{Ticket, MAX_DELIMITER};
