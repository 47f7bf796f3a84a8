//! Server record model

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Canonical stored entity as seen by the engine.
///
/// Only `id`, `updated_at` and `sync_version` carry meaning here; `fields`
/// are resource-specific and opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerRecord {
    pub id: String,
    pub user_id: String,
    pub fields: Map<String, Value>,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Last server-side mutation (Unix ms)
    pub updated_at: i64,
    /// Starts at 1, incremented on every sync-originated update
    pub sync_version: i64,
}

impl ServerRecord {
    /// Current value of a field, `Null` when the record does not carry it.
    pub fn field(&self, name: &str) -> &Value {
        self.fields.get(name).unwrap_or(&Value::Null)
    }
}
