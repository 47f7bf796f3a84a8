//! Database layer for offsync

mod change_store;
mod connection;
mod migrations;
mod record_adapter;

pub use change_store::{ChangeStore, LibSqlChangeStore};
pub use connection::Database;
pub use record_adapter::LibSqlRecordAdapter;
