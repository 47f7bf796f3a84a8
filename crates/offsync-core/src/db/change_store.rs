//! Change record store: the durable, ordered per-user queue of offline mutations

use async_trait::async_trait;
use libsql::{params, Connection, Row};

use crate::error::{Error, Result};
use crate::models::{
    ChangeId, ChangeStatus, Conflict, ConflictLogEntry, ConflictStrategy, NewChange,
    PendingChange, SyncStatusCounts,
};
use crate::util::now_millis;

const CHANGE_COLUMNS: &str = "id, user_id, resource_type, action, payload, client_id, \
     enqueued_at, status, error, processed_at, server_id";

/// Storage operations for queued changes, all scoped to one user
#[async_trait]
pub trait ChangeStore: Send + Sync {
    /// Queue a change; returns its id
    async fn enqueue(&self, change: &NewChange) -> Result<ChangeId>;

    /// Fetch a change by id
    async fn get(&self, id: &ChangeId) -> Result<Option<PendingChange>>;

    /// Pending changes for a user, oldest `enqueued_at` first, id as tie-break
    async fn list_pending(&self, user_id: &str) -> Result<Vec<PendingChange>>;

    /// Changes for a user in replay order, optionally filtered by status
    async fn list(
        &self,
        user_id: &str,
        status: Option<ChangeStatus>,
        limit: usize,
    ) -> Result<Vec<PendingChange>>;

    /// Move a pending change to `completed`, recording the id a create produced
    async fn mark_completed(&self, id: &ChangeId, server_id: Option<&str>) -> Result<()>;

    /// Move a pending change to `failed` with its error message
    async fn mark_failed(&self, id: &ChangeId, error: &str) -> Result<()>;

    /// Reset every failed change of a user back to pending
    async fn reset_failed_to_pending(&self, user_id: &str) -> Result<u64>;

    /// Remove completed changes, optionally only those processed before `older_than` (Unix ms)
    async fn purge_completed(&self, user_id: &str, older_than: Option<i64>) -> Result<u64>;

    /// Number of pending changes for a user
    async fn count_pending(&self, user_id: &str) -> Result<u64>;

    /// Per-status counts for a user
    async fn status_counts(&self, user_id: &str) -> Result<SyncStatusCounts>;

    /// Server id assigned to the completed create that carried `temp_id`
    async fn resolve_temp_id(&self, user_id: &str, temp_id: &str) -> Result<Option<String>>;

    /// Append resolved conflicts to the audit log
    async fn record_conflicts(
        &self,
        change: &PendingChange,
        record_id: &str,
        conflicts: &[Conflict],
        strategy: ConflictStrategy,
    ) -> Result<()>;

    /// Recently resolved conflicts for a user, newest first
    async fn list_conflicts(&self, user_id: &str, limit: usize) -> Result<Vec<ConflictLogEntry>>;

    /// Take the user's drain lease for `holder` unless another holder has an unexpired one.
    ///
    /// Returns false when the lease is held elsewhere.
    async fn acquire_drain_lease(&self, user_id: &str, holder: &str, ttl_ms: i64) -> Result<bool>;

    /// Extend a lease `holder` still owns; false once it has been lost
    async fn renew_drain_lease(&self, user_id: &str, holder: &str, ttl_ms: i64) -> Result<bool>;

    /// Drop the lease if `holder` owns it
    async fn release_drain_lease(&self, user_id: &str, holder: &str) -> Result<()>;
}

/// libSQL implementation of `ChangeStore`
#[derive(Clone)]
pub struct LibSqlChangeStore {
    conn: Connection,
}

impl LibSqlChangeStore {
    /// Create a new store over the given connection
    pub const fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Parse a change from a row selected with `CHANGE_COLUMNS`
    fn parse_change(row: &Row) -> Result<PendingChange> {
        let id: String = row.get(0)?;
        let action: String = row.get(3)?;
        let payload: String = row.get(4)?;
        let status: String = row.get(7)?;

        Ok(PendingChange {
            id: id
                .parse()
                .map_err(|_| Error::Database(format!("invalid change id '{id}'")))?,
            user_id: row.get(1)?,
            resource_type: row.get(2)?,
            action: action.parse()?,
            payload: serde_json::from_str(&payload)?,
            client_id: row.get(5)?,
            enqueued_at: row.get(6)?,
            status: status.parse()?,
            error: row.get(8)?,
            processed_at: row.get(9)?,
            server_id: row.get(10)?,
        })
    }

    fn parse_conflict(row: &Row) -> Result<ConflictLogEntry> {
        let client_value: String = row.get(6)?;
        let server_value: String = row.get(7)?;
        let resolution: String = row.get(8)?;
        let strategy: String = row.get(9)?;

        Ok(ConflictLogEntry {
            id: row.get(0)?,
            change_id: row.get(1)?,
            user_id: row.get(2)?,
            resource_type: row.get(3)?,
            record_id: row.get(4)?,
            field: row.get(5)?,
            client_value: serde_json::from_str(&client_value)?,
            server_value: serde_json::from_str(&server_value)?,
            resolution: resolution.parse()?,
            strategy: strategy.parse()?,
            needs_review: row.get::<i32>(10)? != 0,
            resolved_at: row.get(11)?,
        })
    }

    async fn query_changes(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<PendingChange>> {
        let mut rows = self.conn.query(sql, params).await?;
        let mut changes = Vec::new();
        while let Some(row) = rows.next().await? {
            changes.push(Self::parse_change(&row)?);
        }
        Ok(changes)
    }

    async fn count(&self, user_id: &str, status: ChangeStatus) -> Result<u64> {
        let mut rows = self
            .conn
            .query(
                "SELECT COUNT(*) FROM pending_changes WHERE user_id = ? AND status = ?",
                params![user_id, status.as_str()],
            )
            .await?;

        let count: i64 = match rows.next().await? {
            Some(row) => row.get(0)?,
            None => 0,
        };
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// Transition a change out of `pending`
    async fn finish(
        &self,
        id: &ChangeId,
        status: ChangeStatus,
        error: Option<&str>,
        server_id: Option<&str>,
    ) -> Result<()> {
        let rows = self
            .conn
            .execute(
                "UPDATE pending_changes
                 SET status = ?, error = ?, server_id = ?, processed_at = ?
                 WHERE id = ? AND status = 'pending'",
                params![status.as_str(), error, server_id, now_millis(), id.as_str()],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(format!("pending change {id}")));
        }

        if server_id.is_some() {
            // Mappings outlive the change row so purged creates still resolve
            self.conn
                .execute(
                    "INSERT OR REPLACE INTO temp_id_mappings
                        (user_id, temp_id, server_id, resource_type, mapped_at)
                     SELECT user_id, json_extract(payload, '$.tempId'), server_id,
                            resource_type, processed_at
                     FROM pending_changes
                     WHERE id = ? AND action = 'create' AND server_id IS NOT NULL
                       AND json_extract(payload, '$.tempId') IS NOT NULL",
                    params![id.as_str()],
                )
                .await?;
        }
        Ok(())
    }
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

#[async_trait]
impl ChangeStore for LibSqlChangeStore {
    async fn enqueue(&self, change: &NewChange) -> Result<ChangeId> {
        let user_id = change.user_id.trim();
        if user_id.is_empty() {
            return Err(Error::InvalidInput("user id cannot be empty".into()));
        }
        if change.resource_type.trim().is_empty() {
            return Err(Error::InvalidInput("resource type cannot be empty".into()));
        }

        let id = ChangeId::new();
        let payload = serde_json::to_string(&change.payload)?;
        let enqueued_at = change.enqueued_at.unwrap_or_else(now_millis);

        self.conn
            .execute(
                "INSERT INTO pending_changes
                    (id, user_id, resource_type, action, payload, client_id, enqueued_at, status)
                 VALUES (?, ?, ?, ?, ?, ?, ?, 'pending')",
                params![
                    id.as_str(),
                    user_id,
                    change.resource_type.trim(),
                    change.action.as_str(),
                    payload,
                    change.client_id.as_str(),
                    enqueued_at
                ],
            )
            .await?;

        tracing::debug!(
            change_id = %id,
            user_id,
            resource_type = %change.resource_type,
            action = %change.action,
            "Enqueued change"
        );
        Ok(id)
    }

    async fn get(&self, id: &ChangeId) -> Result<Option<PendingChange>> {
        let sql = format!("SELECT {CHANGE_COLUMNS} FROM pending_changes WHERE id = ?");
        let mut changes = self.query_changes(&sql, params![id.as_str()]).await?;
        Ok(changes.pop())
    }

    async fn list_pending(&self, user_id: &str) -> Result<Vec<PendingChange>> {
        let sql = format!(
            "SELECT {CHANGE_COLUMNS} FROM pending_changes
             WHERE user_id = ? AND status = 'pending'
             ORDER BY enqueued_at ASC, id ASC"
        );
        self.query_changes(&sql, params![user_id]).await
    }

    async fn list(
        &self,
        user_id: &str,
        status: Option<ChangeStatus>,
        limit: usize,
    ) -> Result<Vec<PendingChange>> {
        if let Some(status) = status {
            let sql = format!(
                "SELECT {CHANGE_COLUMNS} FROM pending_changes
                 WHERE user_id = ? AND status = ?
                 ORDER BY enqueued_at ASC, id ASC
                 LIMIT ?"
            );
            self.query_changes(&sql, params![user_id, status.as_str(), sql_limit(limit)])
                .await
        } else {
            let sql = format!(
                "SELECT {CHANGE_COLUMNS} FROM pending_changes
                 WHERE user_id = ?
                 ORDER BY enqueued_at ASC, id ASC
                 LIMIT ?"
            );
            self.query_changes(&sql, params![user_id, sql_limit(limit)])
                .await
        }
    }

    async fn mark_completed(&self, id: &ChangeId, server_id: Option<&str>) -> Result<()> {
        self.finish(id, ChangeStatus::Completed, None, server_id)
            .await
    }

    async fn mark_failed(&self, id: &ChangeId, error: &str) -> Result<()> {
        self.finish(id, ChangeStatus::Failed, Some(error), None)
            .await
    }

    async fn reset_failed_to_pending(&self, user_id: &str) -> Result<u64> {
        let rows = self
            .conn
            .execute(
                "UPDATE pending_changes
                 SET status = 'pending', error = NULL, processed_at = NULL
                 WHERE user_id = ? AND status = 'failed'",
                params![user_id],
            )
            .await?;
        Ok(rows)
    }

    async fn purge_completed(&self, user_id: &str, older_than: Option<i64>) -> Result<u64> {
        let rows = if let Some(cutoff) = older_than {
            self.conn
                .execute(
                    "DELETE FROM pending_changes
                     WHERE user_id = ? AND status = 'completed' AND processed_at < ?",
                    params![user_id, cutoff],
                )
                .await?
        } else {
            self.conn
                .execute(
                    "DELETE FROM pending_changes WHERE user_id = ? AND status = 'completed'",
                    params![user_id],
                )
                .await?
        };
        Ok(rows)
    }

    async fn count_pending(&self, user_id: &str) -> Result<u64> {
        self.count(user_id, ChangeStatus::Pending).await
    }

    async fn status_counts(&self, user_id: &str) -> Result<SyncStatusCounts> {
        let pending = self.count(user_id, ChangeStatus::Pending).await?;
        let completed = self.count(user_id, ChangeStatus::Completed).await?;
        let failed = self.count(user_id, ChangeStatus::Failed).await?;
        Ok(SyncStatusCounts {
            pending,
            completed,
            failed,
            total: pending + completed + failed,
        })
    }

    async fn resolve_temp_id(&self, user_id: &str, temp_id: &str) -> Result<Option<String>> {
        let mut rows = self
            .conn
            .query(
                "SELECT server_id FROM temp_id_mappings WHERE user_id = ? AND temp_id = ?",
                params![user_id, temp_id],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    async fn record_conflicts(
        &self,
        change: &PendingChange,
        record_id: &str,
        conflicts: &[Conflict],
        strategy: ConflictStrategy,
    ) -> Result<()> {
        let resolved_at = now_millis();
        let needs_review = i32::from(strategy == ConflictStrategy::Manual);

        for conflict in conflicts {
            let Some(resolution) = conflict.resolution else {
                return Err(Error::InvalidInput(format!(
                    "conflict on '{}' has no resolution",
                    conflict.field
                )));
            };

            self.conn
                .execute(
                    "INSERT INTO sync_conflicts (
                        change_id, user_id, resource_type, record_id, field,
                        client_value, server_value, resolution, strategy,
                        needs_review, resolved_at
                    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                    params![
                        change.id.as_str(),
                        change.user_id.as_str(),
                        change.resource_type.as_str(),
                        record_id,
                        conflict.field.as_str(),
                        serde_json::to_string(&conflict.client_value)?,
                        serde_json::to_string(&conflict.server_value)?,
                        resolution.as_str(),
                        strategy.as_str(),
                        needs_review,
                        resolved_at
                    ],
                )
                .await?;
        }
        Ok(())
    }

    async fn list_conflicts(&self, user_id: &str, limit: usize) -> Result<Vec<ConflictLogEntry>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, change_id, user_id, resource_type, record_id, field,
                        client_value, server_value, resolution, strategy,
                        needs_review, resolved_at
                 FROM sync_conflicts
                 WHERE user_id = ?
                 ORDER BY resolved_at DESC, id DESC
                 LIMIT ?",
                params![user_id, sql_limit(limit)],
            )
            .await?;

        let mut conflicts = Vec::new();
        while let Some(row) = rows.next().await? {
            conflicts.push(Self::parse_conflict(&row)?);
        }
        Ok(conflicts)
    }

    async fn acquire_drain_lease(&self, user_id: &str, holder: &str, ttl_ms: i64) -> Result<bool> {
        let now = now_millis();
        let rows = self
            .conn
            .execute(
                "INSERT INTO drain_leases (user_id, holder, expires_at) VALUES (?, ?, ?)
                 ON CONFLICT(user_id) DO UPDATE
                 SET holder = excluded.holder, expires_at = excluded.expires_at
                 WHERE drain_leases.holder = excluded.holder OR drain_leases.expires_at <= ?",
                params![user_id, holder, now.saturating_add(ttl_ms), now],
            )
            .await?;
        Ok(rows > 0)
    }

    async fn renew_drain_lease(&self, user_id: &str, holder: &str, ttl_ms: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute(
                "UPDATE drain_leases SET expires_at = ? WHERE user_id = ? AND holder = ?",
                params![now_millis().saturating_add(ttl_ms), user_id, holder],
            )
            .await?;
        Ok(rows > 0)
    }

    async fn release_drain_lease(&self, user_id: &str, holder: &str) -> Result<()> {
        self.conn
            .execute(
                "DELETE FROM drain_leases WHERE user_id = ? AND holder = ?",
                params![user_id, holder],
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{ChangeAction, ChangePayload, Resolution};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    async fn setup() -> (Database, LibSqlChangeStore) {
        let db = Database::open_in_memory().await.unwrap();
        let store = LibSqlChangeStore::new(db.connection());
        (db, store)
    }

    fn update(user: &str, at: i64) -> NewChange {
        NewChange::new(
            user,
            "earnings",
            ChangeAction::Update,
            ChangePayload::for_record("rec-1").with_field("amount", at),
            "device-a",
        )
        .captured_at(at)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_enqueue_and_get() {
        let (_db, store) = setup().await;

        let id = store.enqueue(&update("user-1", 1_000)).await.unwrap();
        let change = store.get(&id).await.unwrap().unwrap();

        assert_eq!(change.user_id, "user-1");
        assert_eq!(change.action, ChangeAction::Update);
        assert_eq!(change.status, ChangeStatus::Pending);
        assert_eq!(change.enqueued_at, 1_000);
        assert_eq!(change.payload.id.as_deref(), Some("rec-1"));
        assert_eq!(change.payload.fields["amount"], json!(1_000));
        assert!(change.processed_at.is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_enqueue_rejects_blank_user() {
        let (_db, store) = setup().await;
        let err = store.enqueue(&update("  ", 1)).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_list_pending_orders_by_capture_time() {
        let (_db, store) = setup().await;

        let third = store.enqueue(&update("user-1", 3_000)).await.unwrap();
        let first = store.enqueue(&update("user-1", 1_000)).await.unwrap();
        let second = store.enqueue(&update("user-1", 2_000)).await.unwrap();
        store.enqueue(&update("user-2", 500)).await.unwrap();

        let ids = store
            .list_pending("user-1")
            .await
            .unwrap()
            .into_iter()
            .map(|change| change.id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![first, second, third]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_same_timestamp_ties_break_on_id() {
        let (_db, store) = setup().await;

        let a = store.enqueue(&update("user-1", 1_000)).await.unwrap();
        let b = store.enqueue(&update("user-1", 1_000)).await.unwrap();

        let pending = store.list_pending("user-1").await.unwrap();
        let mut expected = vec![a, b];
        expected.sort_by_key(ChangeId::as_str);
        assert_eq!(
            pending.iter().map(|change| change.id).collect::<Vec<_>>(),
            expected
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_mark_transitions_only_pending() {
        let (_db, store) = setup().await;

        let id = store.enqueue(&update("user-1", 1)).await.unwrap();
        store.mark_completed(&id, None).await.unwrap();

        let change = store.get(&id).await.unwrap().unwrap();
        assert_eq!(change.status, ChangeStatus::Completed);
        assert!(change.processed_at.is_some());

        let err = store.mark_failed(&id, "late").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_reset_failed_and_counts() {
        let (_db, store) = setup().await;

        let failed = store.enqueue(&update("user-1", 1)).await.unwrap();
        let done = store.enqueue(&update("user-1", 2)).await.unwrap();
        store.enqueue(&update("user-1", 3)).await.unwrap();

        store.mark_failed(&failed, "boom").await.unwrap();
        store.mark_completed(&done, None).await.unwrap();

        let counts = store.status_counts("user-1").await.unwrap();
        assert_eq!(
            counts,
            SyncStatusCounts {
                pending: 1,
                completed: 1,
                failed: 1,
                total: 3,
            }
        );

        let failed_rows = store
            .list("user-1", Some(ChangeStatus::Failed), 10)
            .await
            .unwrap();
        assert_eq!(failed_rows.len(), 1);
        assert_eq!(failed_rows[0].error.as_deref(), Some("boom"));

        assert_eq!(store.reset_failed_to_pending("user-1").await.unwrap(), 1);
        assert_eq!(store.reset_failed_to_pending("user-1").await.unwrap(), 0);
        assert_eq!(store.count_pending("user-1").await.unwrap(), 2);

        let reset = store.get(&failed).await.unwrap().unwrap();
        assert_eq!(reset.status, ChangeStatus::Pending);
        assert!(reset.error.is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_purge_completed_keeps_failed_and_pending() {
        let (_db, store) = setup().await;

        let done = store.enqueue(&update("user-1", 1)).await.unwrap();
        let failed = store.enqueue(&update("user-1", 2)).await.unwrap();
        store.enqueue(&update("user-1", 3)).await.unwrap();
        store.mark_completed(&done, None).await.unwrap();
        store.mark_failed(&failed, "boom").await.unwrap();

        assert_eq!(store.purge_completed("user-1", Some(0)).await.unwrap(), 0);
        assert_eq!(store.purge_completed("user-1", None).await.unwrap(), 1);

        let counts = store.status_counts("user-1").await.unwrap();
        assert_eq!(counts.completed, 0);
        assert_eq!(counts.failed, 1);
        assert_eq!(counts.pending, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_resolve_temp_id_after_completed_create() {
        let (_db, store) = setup().await;

        let create = NewChange::new(
            "user-1",
            "goals",
            ChangeAction::Create,
            ChangePayload::default()
                .with_temp_id("tmp-1")
                .with_field("title", "save"),
            "device-a",
        );
        let id = store.enqueue(&create).await.unwrap();
        assert_eq!(store.resolve_temp_id("user-1", "tmp-1").await.unwrap(), None);

        store.mark_completed(&id, Some("srv-9")).await.unwrap();
        assert_eq!(
            store.resolve_temp_id("user-1", "tmp-1").await.unwrap(),
            Some("srv-9".to_string())
        );
        assert_eq!(store.resolve_temp_id("user-2", "tmp-1").await.unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_record_and_list_conflicts() {
        let (_db, store) = setup().await;

        let id = store.enqueue(&update("user-1", 1)).await.unwrap();
        let change = store.get(&id).await.unwrap().unwrap();

        let mut conflict = Conflict::new("amount", json!(150), json!(100));
        conflict.resolution = Some(Resolution::Server);
        store
            .record_conflicts(&change, "rec-1", &[conflict], ConflictStrategy::Manual)
            .await
            .unwrap();

        let logged = store.list_conflicts("user-1", 10).await.unwrap();
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].field, "amount");
        assert_eq!(logged[0].client_value, json!(150));
        assert_eq!(logged[0].resolution, Resolution::Server);
        assert_eq!(logged[0].strategy, ConflictStrategy::Manual);
        assert!(logged[0].needs_review);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_temp_id_mapping_survives_purge() {
        let (_db, store) = setup().await;

        let id = store
            .enqueue(&NewChange::new(
                "user-1",
                "goals",
                ChangeAction::Create,
                ChangePayload::default().with_temp_id("tmp-1"),
                "device-a",
            ))
            .await
            .unwrap();
        store.mark_completed(&id, Some("srv-1")).await.unwrap();
        assert_eq!(store.purge_completed("user-1", None).await.unwrap(), 1);

        assert_eq!(
            store.resolve_temp_id("user-1", "tmp-1").await.unwrap(),
            Some("srv-1".to_string())
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_enqueue_trims_user_id() {
        let (_db, store) = setup().await;

        store.enqueue(&update(" user-1 ", 5)).await.unwrap();

        let pending = store.list_pending("user-1").await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].user_id, "user-1");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_drain_lease_is_exclusive_until_released_or_expired() {
        let (_db, store) = setup().await;

        assert!(store.acquire_drain_lease("user-1", "a", 60_000).await.unwrap());
        assert!(!store.acquire_drain_lease("user-1", "b", 60_000).await.unwrap());
        assert!(store.acquire_drain_lease("user-2", "b", 60_000).await.unwrap());

        // Only the holder can renew or release
        assert!(store.renew_drain_lease("user-1", "a", 60_000).await.unwrap());
        assert!(!store.renew_drain_lease("user-1", "b", 60_000).await.unwrap());
        store.release_drain_lease("user-1", "b").await.unwrap();
        assert!(!store.acquire_drain_lease("user-1", "b", 60_000).await.unwrap());

        store.release_drain_lease("user-1", "a").await.unwrap();
        assert!(store.acquire_drain_lease("user-1", "b", 60_000).await.unwrap());

        // An expired lease can be taken over
        store.release_drain_lease("user-1", "b").await.unwrap();
        assert!(store.acquire_drain_lease("user-1", "a", -1).await.unwrap());
        assert!(store.acquire_drain_lease("user-1", "b", 60_000).await.unwrap());
        assert!(!store.renew_drain_lease("user-1", "a", 60_000).await.unwrap());
    }
}
