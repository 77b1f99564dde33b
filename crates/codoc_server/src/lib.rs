//! # codoc Server
//!
//! The PushPull pipeline of the codoc synchronization core.
//!
//! This crate provides:
//! - The [`SyncServer`] entry points (activate, attach, detach, push-pull,
//!   watch)
//! - The per-document [`LockManager`] and the document [`EventBus`]
//! - The push / pull / snapshot stages and the minimum-synced-ticket
//!   bookkeeping behind them
//! - The [`Materializer`] seam towards the CRDT module

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod config;
mod error;
mod event;
mod lock;
mod materializer;
mod packs;
mod server;

pub use backend::{push_pull_key, snapshot_key, Backend};
pub use config::{
    Config, ConfigError, DEFAULT_AUTH_WEBHOOK_CACHE_AUTH_TTL,
    DEFAULT_AUTH_WEBHOOK_CACHE_UNAUTH_TTL, DEFAULT_AUTH_WEBHOOK_MAX_RETRIES,
    DEFAULT_AUTH_WEBHOOK_MAX_WAIT_INTERVAL, DEFAULT_PROFILING_PORT, DEFAULT_RPC_MAX_REQUEST_BYTES,
    DEFAULT_RPC_PORT, DEFAULT_SNAPSHOT_INTERVAL, DEFAULT_SNAPSHOT_THRESHOLD,
};
pub use error::{SyncError, SyncResult};
pub use event::{DocEvent, DocEventKind, EventBus};
pub use lock::{LockError, LockGuard, LockManager};
pub use materializer::{MaterializeError, MaterializedDoc, Materializer, OpLogMaterializer};
pub use packs::{push_pull, ServerPack};
pub use server::SyncServer;
