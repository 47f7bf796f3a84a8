//! Sync engine service: wires the change store, adapters and processor together.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::adapter::{AdapterRegistry, ResourceAdapter};
use crate::config::EngineConfig;
use crate::db::{ChangeStore, Database, LibSqlChangeStore, LibSqlRecordAdapter};
use crate::error::{Error, Result};
use crate::models::{
    ChangeId, ChangeStatus, ConflictLogEntry, ConflictStrategy, NewChange, PendingChange,
    ServerRecord, SyncResult, SyncStatusCounts,
};
use crate::sync::SyncProcessor;

/// Thread-safe entry point for enqueueing, draining and inspecting changes.
#[derive(Clone)]
pub struct SyncService {
    db: Arc<Database>,
    db_path: Option<PathBuf>,
    store: Arc<LibSqlChangeStore>,
    registry: Arc<AdapterRegistry>,
    processor: SyncProcessor,
    drain_deadline: Option<Duration>,
}

impl SyncService {
    /// Open the service at the configured database path.
    pub async fn open(config: &EngineConfig) -> Result<Self> {
        let db_path = config.db_path.clone().ok_or_else(|| {
            Error::Config("OFFSYNC_DB_PATH is not set and no database path was given".to_string())
        })?;
        Self::open_path(db_path, config).await
    }

    /// Open the service at `db_path`, ignoring `config.db_path`.
    pub async fn open_path(db_path: impl Into<PathBuf>, config: &EngineConfig) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::open(&db_path).await?;
        tracing::info!("Opened offsync database at {}", db_path.display());
        Ok(Self::from_database(db, Some(db_path), config))
    }

    /// Open an in-memory service (primarily for tests).
    pub async fn open_in_memory(config: &EngineConfig) -> Result<Self> {
        let db = Database::open_in_memory().await?;
        Ok(Self::from_database(db, None, config))
    }

    fn from_database(db: Database, db_path: Option<PathBuf>, config: &EngineConfig) -> Self {
        let store = Arc::new(LibSqlChangeStore::new(db.connection()));

        let mut registry = AdapterRegistry::new();
        for resource_type in &config.resources {
            registry.register(
                resource_type.as_str(),
                Arc::new(LibSqlRecordAdapter::new(db.connection(), resource_type.as_str())),
            );
        }
        let registry = Arc::new(registry);

        Self {
            processor: SyncProcessor::new(store.clone(), registry.clone()),
            db: Arc::new(db),
            db_path,
            store,
            registry,
            drain_deadline: config.drain_deadline,
        }
    }

    /// Register (or replace) the adapter for a resource type.
    #[must_use]
    pub fn with_adapter(
        mut self,
        resource_type: impl Into<String>,
        adapter: Arc<dyn ResourceAdapter>,
    ) -> Self {
        let mut registry = (*self.registry).clone();
        registry.register(resource_type, adapter);
        self.registry = Arc::new(registry);
        self.processor = self.processor.with_registry(self.registry.clone());
        self
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    pub fn resource_types(&self) -> Vec<&str> {
        self.registry.resource_types()
    }

    pub fn processor(&self) -> &SyncProcessor {
        &self.processor
    }

    /// Queue a change captured on a client device.
    ///
    /// Unknown resource types are accepted here and fail when drained.
    pub async fn enqueue(&self, change: &NewChange) -> Result<ChangeId> {
        self.store.enqueue(change).await
    }

    /// Apply every pending change for a user within the configured deadline.
    pub async fn drain(&self, user_id: &str, strategy: ConflictStrategy) -> Result<Vec<SyncResult>> {
        self.processor
            .drain_until(user_id, strategy, self.deadline())
            .await
    }

    /// Move a user's failed changes back to pending and drain them.
    pub async fn retry(&self, user_id: &str, strategy: ConflictStrategy) -> Result<Vec<SyncResult>> {
        self.processor
            .retry_until(user_id, strategy, self.deadline())
            .await
    }

    pub async fn status(&self, user_id: &str) -> Result<SyncStatusCounts> {
        self.store.status_counts(user_id).await
    }

    pub async fn count_pending(&self, user_id: &str) -> Result<u64> {
        self.store.count_pending(user_id).await
    }

    /// Delete completed changes, optionally only those processed before `older_than` (Unix ms).
    pub async fn purge_completed(&self, user_id: &str, older_than: Option<i64>) -> Result<u64> {
        let purged = self.store.purge_completed(user_id, older_than).await?;
        tracing::info!(user_id, purged, "Purged completed changes");
        Ok(purged)
    }

    pub async fn list_changes(
        &self,
        user_id: &str,
        status: Option<ChangeStatus>,
        limit: usize,
    ) -> Result<Vec<PendingChange>> {
        self.store.list(user_id, status, limit).await
    }

    pub async fn list_conflicts(&self, user_id: &str, limit: usize) -> Result<Vec<ConflictLogEntry>> {
        self.store.list_conflicts(user_id, limit).await
    }

    /// Live records of a resource type owned by a user
    pub async fn list_records(
        &self,
        resource_type: &str,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<ServerRecord>> {
        self.registry.resolve(resource_type)?;
        LibSqlRecordAdapter::new(self.db.connection(), resource_type)
            .list_for_user(user_id, limit)
            .await
    }

    fn deadline(&self) -> Option<Instant> {
        self.drain_deadline.map(|budget| Instant::now() + budget)
    }
}
