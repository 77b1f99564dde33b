//! # codoc Store
//!
//! Persistence abstraction for the codoc sync core.
//!
//! This crate provides:
//! - The persisted record types (clients, documents, changes, snapshots,
//!   synced sequences)
//! - The abstract async [`Store`] trait every backend implements
//! - [`MemoryStore`], the in-memory implementation used by tests and
//!   ephemeral deployments

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod change_info;
mod client_info;
mod doc_info;
mod error;
mod id;
mod memory;
mod snapshot_info;
mod store;
mod synced_seq;

pub use change_info::ChangeInfo;
pub use client_info::{AttachStatus, ClientDocInfo, ClientInfo, ClientStatus};
pub use doc_info::DocInfo;
pub use error::{StoreError, StoreResult};
pub use id::Id;
pub use memory::MemoryStore;
pub use snapshot_info::SnapshotInfo;
pub use store::Store;
pub use synced_seq::SyncedSeqInfo;
