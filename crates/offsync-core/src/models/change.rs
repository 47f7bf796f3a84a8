//! Queued change model

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::Error;

/// Identity and bookkeeping fields that a payload never writes or conflicts on.
pub const BOOKKEEPING_FIELDS: &[&str] = &[
    "id",
    "userId",
    "createdAt",
    "updatedAt",
    "syncVersion",
    "user_id",
    "created_at",
    "updated_at",
    "sync_version",
];

/// Returns true if `field` is an identity/bookkeeping field.
pub fn is_bookkeeping_field(field: &str) -> bool {
    BOOKKEEPING_FIELDS.contains(&field)
}

/// A unique identifier for a queued change, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChangeId(Uuid);

impl ChangeId {
    /// Create a new unique change ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for ChangeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ChangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ChangeId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Mutation kind carried by a queued change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Create,
    Update,
    Delete,
}

impl ChangeAction {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            other => Err(Error::InvalidInput(format!("unknown change action '{other}'"))),
        }
    }
}

/// Lifecycle state of a queued change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeStatus {
    Pending,
    Completed,
    Failed,
}

impl ChangeStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(Error::InvalidInput(format!("unknown change status '{other}'"))),
        }
    }
}

/// Client-proposed values for a change.
///
/// `id` targets an existing record for update/delete. `temp_id` is the client's
/// placeholder for a record it created offline. Every other key is a field value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_id: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ChangePayload {
    /// Payload targeting an existing record
    #[must_use]
    pub fn for_record(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Attach a client temporary id
    #[must_use]
    pub fn with_temp_id(mut self, temp_id: impl Into<String>) -> Self {
        self.temp_id = Some(temp_id.into());
        self
    }

    /// Set a proposed field value
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Fields the change may write, with bookkeeping fields removed.
    pub fn writable_fields(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .filter(|(name, _)| !is_bookkeeping_field(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

/// A queued mutation awaiting server-side application.
///
/// Only `status`, `error`, `processed_at` and `server_id` change after enqueue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingChange {
    pub id: ChangeId,
    pub user_id: String,
    pub resource_type: String,
    pub action: ChangeAction,
    pub payload: ChangePayload,
    pub client_id: String,
    /// Client capture time (Unix ms); the base time conflicts are judged against
    pub enqueued_at: i64,
    pub status: ChangeStatus,
    pub error: Option<String>,
    pub processed_at: Option<i64>,
    /// Server id assigned by a completed create
    pub server_id: Option<String>,
}

/// Input for enqueueing a change
#[derive(Debug, Clone, PartialEq)]
pub struct NewChange {
    pub user_id: String,
    pub resource_type: String,
    pub action: ChangeAction,
    pub payload: ChangePayload,
    pub client_id: String,
    /// Client capture time; defaults to the enqueue time when absent
    pub enqueued_at: Option<i64>,
}

impl NewChange {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        resource_type: impl Into<String>,
        action: ChangeAction,
        payload: ChangePayload,
        client_id: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            resource_type: resource_type.into(),
            action,
            payload,
            client_id: client_id.into(),
            enqueued_at: None,
        }
    }

    /// Set the client capture time (Unix ms)
    #[must_use]
    pub const fn captured_at(mut self, timestamp_ms: i64) -> Self {
        self.enqueued_at = Some(timestamp_ms);
        self
    }
}
