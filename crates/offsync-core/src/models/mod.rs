//! Data models for offsync

mod change;
mod conflict;
mod record;
mod result;

pub use change::{
    is_bookkeeping_field, ChangeAction, ChangeId, ChangePayload, ChangeStatus, NewChange,
    PendingChange, BOOKKEEPING_FIELDS,
};
pub use conflict::{Conflict, ConflictLogEntry, ConflictStrategy, Resolution};
pub use record::ServerRecord;
pub use result::{FailureKind, SyncResult, SyncStatusCounts, TempIdRemap};
