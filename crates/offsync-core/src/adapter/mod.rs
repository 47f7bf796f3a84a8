//! Resource adapters: the seam between the engine and the storage that owns
//! each business entity

mod registry;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::models::ServerRecord;

pub use registry::AdapterRegistry;

/// Create/read/update/delete operations for one resource type.
///
/// Implementations report a missing record from `fetch` as `Ok(None)` and from
/// `apply_update`/`delete` as `Error::NotFound`.
#[async_trait]
pub trait ResourceAdapter: Send + Sync {
    /// Insert a new record owned by `user_id`; `sync_version` starts at 1
    async fn create(&self, user_id: &str, fields: &Map<String, Value>) -> Result<ServerRecord>;

    /// Current record, or `None` if absent or deleted
    async fn fetch(&self, id: &str) -> Result<Option<ServerRecord>>;

    /// Write `fields` over the stored values and set `sync_version` to `new_sync_version`
    async fn apply_update(
        &self,
        id: &str,
        fields: &Map<String, Value>,
        new_sync_version: i64,
    ) -> Result<ServerRecord>;

    /// Remove a record
    async fn delete(&self, id: &str) -> Result<()>;
}
