//! Drain outcome models

use serde::{Deserialize, Serialize};

use super::{ChangeId, Conflict};

/// Classification of a per-change failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// No adapter registered for the change's resource type
    UnknownResource,
    /// Update target no longer exists
    NotFound,
    /// Storage layer raised an error
    AdapterError,
}

impl FailureKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnknownResource => "UnknownResource",
            Self::NotFound => "NotFound",
            Self::AdapterError => "AdapterError",
        }
    }
}

/// Client temporary id mapped to the id the server assigned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TempIdRemap {
    pub temp_id: String,
    pub server_id: String,
}

/// Outcome of applying one queued change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    pub change_id: ChangeId,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<Conflict>,
    /// Conflicts were kept server-side and await review
    #[serde(default)]
    pub unresolved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remap: Option<TempIdRemap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SyncResult {
    pub const fn succeeded(change_id: ChangeId) -> Self {
        Self {
            change_id,
            success: true,
            conflicts: Vec::new(),
            unresolved: false,
            remap: None,
            failure: None,
            error: None,
        }
    }

    pub fn failed(change_id: ChangeId, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            change_id,
            success: false,
            conflicts: Vec::new(),
            unresolved: false,
            remap: None,
            failure: Some(kind),
            error: Some(message.into()),
        }
    }

    #[must_use]
    pub fn with_remap(mut self, remap: Option<TempIdRemap>) -> Self {
        self.remap = remap;
        self
    }

    #[must_use]
    pub fn with_conflicts(mut self, conflicts: Vec<Conflict>, unresolved: bool) -> Self {
        self.unresolved = unresolved && !conflicts.is_empty();
        self.conflicts = conflicts;
        self
    }
}

/// Per-user queue counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatusCounts {
    pub pending: u64,
    pub completed: u64,
    pub failed: u64,
    pub total: u64,
}
