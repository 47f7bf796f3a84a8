//! offsync-core - Offline sync and conflict resolution engine
//!
//! Clients queue mutations captured while offline; the engine replays them
//! per user against server-side records, detects field conflicts against the
//! client's base time, and resolves them with a caller-chosen strategy.

pub mod adapter;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod sync;
mod util;

pub use adapter::{AdapterRegistry, ResourceAdapter};
pub use config::EngineConfig;
pub use error::{Error, Result};
pub use models::{
    ChangeAction, ChangeId, ChangePayload, ChangeStatus, Conflict, ConflictStrategy, NewChange,
    PendingChange, ServerRecord, SyncResult,
};
pub use services::SyncService;
