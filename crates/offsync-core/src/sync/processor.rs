//! Sync processor: replays a user's queue through the resource adapters

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::Instant;
use uuid::Uuid;

use super::{detect_conflicts, resolve_conflicts};
use crate::adapter::AdapterRegistry;
use crate::db::ChangeStore;
use crate::error::{Error, Result};
use crate::models::{
    ChangeAction, ConflictStrategy, FailureKind, PendingChange, SyncResult, TempIdRemap,
};

/// Lifetime of a drain lease between renewals (one renewal per change)
const DRAIN_LEASE_TTL_MS: i64 = 60_000;

/// Drains per-user change queues.
///
/// At most one drain or retry runs per user at a time. Within a processor
/// (and its clones) a second request for the same user waits for the first;
/// a drain running elsewhere on the same store holds the user's lease and a
/// request meeting it fails with `Error::DrainInProgress`. Different users
/// proceed in parallel.
#[derive(Clone)]
pub struct SyncProcessor {
    store: Arc<dyn ChangeStore>,
    registry: Arc<AdapterRegistry>,
    user_locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

/// A change that could not be applied
#[derive(Debug)]
struct ChangeFailure {
    kind: FailureKind,
    message: String,
}

impl ChangeFailure {
    fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<Error> for ChangeFailure {
    fn from(error: Error) -> Self {
        let kind = match error {
            Error::UnknownResource(_) => FailureKind::UnknownResource,
            Error::NotFound(_) => FailureKind::NotFound,
            _ => FailureKind::AdapterError,
        };
        Self::new(kind, error.to_string())
    }
}

/// A successfully applied change and the bookkeeping it produced
struct Applied {
    result: SyncResult,
    server_id: Option<String>,
    record_id: Option<String>,
}

impl SyncProcessor {
    pub fn new(store: Arc<dyn ChangeStore>, registry: Arc<AdapterRegistry>) -> Self {
        Self {
            store,
            registry,
            user_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Processor over another registry that keeps this one's store and drain locks
    #[must_use]
    pub fn with_registry(&self, registry: Arc<AdapterRegistry>) -> Self {
        Self {
            store: Arc::clone(&self.store),
            registry,
            user_locks: Arc::clone(&self.user_locks),
        }
    }

    /// Apply every pending change of `user_id` in replay order.
    ///
    /// Per-change failures are reported in the results; only change store
    /// failures are returned as `Err`.
    pub async fn drain(
        &self,
        user_id: &str,
        strategy: ConflictStrategy,
    ) -> Result<Vec<SyncResult>> {
        self.drain_until(user_id, strategy, None).await
    }

    /// `drain` that stops taking new changes once `deadline` passes.
    ///
    /// Changes not reached stay pending and are absent from the results.
    pub async fn drain_until(
        &self,
        user_id: &str,
        strategy: ConflictStrategy,
        deadline: Option<Instant>,
    ) -> Result<Vec<SyncResult>> {
        let user_id = user_id.trim();
        let lease = Uuid::now_v7().to_string();
        self.exclusive(user_id, &lease, || {
            self.drain_locked(user_id, strategy, deadline, &lease)
        })
        .await
    }

    /// Reset the user's failed changes to pending, then drain
    pub async fn retry(
        &self,
        user_id: &str,
        strategy: ConflictStrategy,
    ) -> Result<Vec<SyncResult>> {
        self.retry_until(user_id, strategy, None).await
    }

    /// `retry` with an overall batch deadline
    pub async fn retry_until(
        &self,
        user_id: &str,
        strategy: ConflictStrategy,
        deadline: Option<Instant>,
    ) -> Result<Vec<SyncResult>> {
        let user_id = user_id.trim();
        let lease = Uuid::now_v7().to_string();
        let lease = lease.as_str();
        self.exclusive(user_id, lease, || async move {
            let reset = self.store.reset_failed_to_pending(user_id).await?;
            tracing::info!(user_id, reset, "Reset failed changes to pending");
            self.drain_locked(user_id, strategy, deadline, lease).await
        })
        .await
    }

    /// Run `work` while holding the user's drain lock and store lease
    async fn exclusive<F, Fut>(&self, user_id: &str, lease: &str, work: F) -> Result<Vec<SyncResult>>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<Vec<SyncResult>>>,
    {
        let user_lock = {
            let mut locks = self.user_locks.lock().await;
            Arc::clone(locks.entry(user_id.to_string()).or_default())
        };

        let results = {
            let _guard = user_lock.lock().await;
            self.leased(user_id, lease, work).await
        };

        drop(user_lock);
        let mut locks = self.user_locks.lock().await;
        if locks
            .get(user_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(user_id);
        }

        results
    }

    async fn leased<F, Fut>(&self, user_id: &str, lease: &str, work: F) -> Result<Vec<SyncResult>>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<Vec<SyncResult>>>,
    {
        if !self
            .store
            .acquire_drain_lease(user_id, lease, DRAIN_LEASE_TTL_MS)
            .await?
        {
            tracing::warn!(user_id, "Drain lease held elsewhere; rejecting drain");
            return Err(Error::DrainInProgress(user_id.to_string()));
        }

        let results = work().await;
        if let Err(error) = self.store.release_drain_lease(user_id, lease).await {
            tracing::warn!(user_id, "Failed to release drain lease: {error}");
        }
        results
    }

    async fn drain_locked(
        &self,
        user_id: &str,
        strategy: ConflictStrategy,
        deadline: Option<Instant>,
        lease: &str,
    ) -> Result<Vec<SyncResult>> {
        let pending = self.store.list_pending(user_id).await?;
        tracing::info!(
            user_id,
            pending = pending.len(),
            strategy = %strategy,
            "Draining change queue"
        );

        let total = pending.len();
        let mut results = Vec::with_capacity(total);
        for change in pending {
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                tracing::info!(
                    user_id,
                    remaining = total - results.len(),
                    "Drain deadline reached; leaving remaining changes pending"
                );
                break;
            }
            if !self
                .store
                .renew_drain_lease(user_id, lease, DRAIN_LEASE_TTL_MS)
                .await?
            {
                tracing::warn!(
                    user_id,
                    remaining = total - results.len(),
                    "Drain lease lost; leaving remaining changes pending"
                );
                break;
            }

            let target = self.resolve_target(&change).await?;
            let result = match self.apply(&change, target, strategy).await {
                Ok(applied) => {
                    if !applied.result.conflicts.is_empty() {
                        let record_id = applied.record_id.as_deref().unwrap_or_default();
                        self.store
                            .record_conflicts(&change, record_id, &applied.result.conflicts, strategy)
                            .await?;
                    }
                    self.store
                        .mark_completed(&change.id, applied.server_id.as_deref())
                        .await?;
                    if applied.result.unresolved {
                        tracing::warn!(
                            change_id = %change.id,
                            conflicts = applied.result.conflicts.len(),
                            "Conflicts kept server values and need review"
                        );
                    }
                    tracing::debug!(
                        change_id = %change.id,
                        action = %change.action,
                        resource_type = %change.resource_type,
                        "Applied change"
                    );
                    applied.result
                }
                Err(failure) => {
                    tracing::warn!(
                        change_id = %change.id,
                        kind = failure.kind.as_str(),
                        "Change failed: {}",
                        failure.message
                    );
                    self.store.mark_failed(&change.id, &failure.message).await?;
                    SyncResult::failed(change.id, failure.kind, failure.message)
                }
            };
            results.push(result);
        }

        let failed = results.iter().filter(|result| !result.success).count();
        tracing::info!(
            user_id,
            processed = results.len(),
            failed,
            "Drain finished"
        );
        Ok(results)
    }

    /// Target record id, following a temp id to the server id its create produced
    async fn resolve_target(&self, change: &PendingChange) -> Result<Option<String>> {
        let Some(id) = change.payload.id.as_deref() else {
            return Ok(None);
        };
        if change.action == ChangeAction::Create {
            return Ok(Some(id.to_string()));
        }

        let mapped = self.store.resolve_temp_id(&change.user_id, id).await?;
        if let Some(server_id) = &mapped {
            tracing::debug!(change_id = %change.id, temp_id = id, server_id = %server_id, "Resolved temp id");
        }
        Ok(Some(mapped.unwrap_or_else(|| id.to_string())))
    }

    async fn apply(
        &self,
        change: &PendingChange,
        target: Option<String>,
        strategy: ConflictStrategy,
    ) -> std::result::Result<Applied, ChangeFailure> {
        let adapter = self.registry.resolve(&change.resource_type)?;

        match change.action {
            ChangeAction::Create => {
                let record = adapter
                    .create(&change.user_id, &change.payload.writable_fields())
                    .await?;
                let remap = change.payload.temp_id.clone().map(|temp_id| TempIdRemap {
                    temp_id,
                    server_id: record.id.clone(),
                });

                Ok(Applied {
                    result: SyncResult::succeeded(change.id).with_remap(remap),
                    record_id: Some(record.id.clone()),
                    server_id: Some(record.id),
                })
            }
            ChangeAction::Update => {
                let id = target.ok_or_else(|| missing_target(change))?;
                let record = adapter.fetch(&id).await?.ok_or_else(|| {
                    ChangeFailure::new(
                        FailureKind::NotFound,
                        format!("{} record {id} not found", change.resource_type),
                    )
                })?;

                let mut conflicts = detect_conflicts(&record, change);
                let fields = if conflicts.is_empty() {
                    change.payload.writable_fields()
                } else {
                    resolve_conflicts(&record, change, &mut conflicts, strategy)
                };
                adapter
                    .apply_update(&id, &fields, record.sync_version + 1)
                    .await?;

                let unresolved = strategy == ConflictStrategy::Manual;
                Ok(Applied {
                    result: SyncResult::succeeded(change.id).with_conflicts(conflicts, unresolved),
                    server_id: None,
                    record_id: Some(id),
                })
            }
            ChangeAction::Delete => {
                let id = target.ok_or_else(|| missing_target(change))?;
                match adapter.delete(&id).await {
                    Ok(()) => {}
                    Err(Error::NotFound(_)) => {
                        tracing::debug!(change_id = %change.id, record_id = %id, "Record already deleted");
                    }
                    Err(error) => return Err(error.into()),
                }

                Ok(Applied {
                    result: SyncResult::succeeded(change.id),
                    server_id: None,
                    record_id: Some(id),
                })
            }
        }
    }
}

fn missing_target(change: &PendingChange) -> ChangeFailure {
    ChangeFailure::new(
        FailureKind::AdapterError,
        format!("{} change has no target record id", change.action),
    )
}
