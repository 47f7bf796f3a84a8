//! Generic resource adapter storing records as JSON documents

use async_trait::async_trait;
use libsql::{params, Connection, Row};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::adapter::ResourceAdapter;
use crate::error::{Error, Result};
use crate::models::ServerRecord;
use crate::util::now_millis;

/// libSQL-backed `ResourceAdapter` for one resource type.
///
/// Every resource type shares the `records` table, keyed by
/// `(resource_type, id)`. Deletes are soft so a later delete of the same id
/// reports `NotFound`.
#[derive(Clone)]
pub struct LibSqlRecordAdapter {
    conn: Connection,
    resource_type: String,
}

impl LibSqlRecordAdapter {
    /// Create an adapter for `resource_type` over the given connection
    pub fn new(conn: Connection, resource_type: impl Into<String>) -> Self {
        Self {
            conn,
            resource_type: resource_type.into(),
        }
    }

    /// Resource type this adapter serves
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Live records owned by a user, most recently updated first
    pub async fn list_for_user(&self, user_id: &str, limit: usize) -> Result<Vec<ServerRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, user_id, fields, created_at, updated_at, sync_version
                 FROM records
                 WHERE resource_type = ? AND user_id = ? AND is_deleted = 0
                 ORDER BY updated_at DESC
                 LIMIT ?",
                params![
                    self.resource_type.as_str(),
                    user_id,
                    i64::try_from(limit).unwrap_or(i64::MAX)
                ],
            )
            .await?;

        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(Self::parse_record(&row)?);
        }
        Ok(records)
    }

    fn parse_record(row: &Row) -> Result<ServerRecord> {
        let fields: String = row.get(2)?;
        let fields = match serde_json::from_str::<Value>(&fields)? {
            Value::Object(map) => map,
            other => {
                return Err(Error::Database(format!(
                    "record fields must be a JSON object, found {other}"
                )))
            }
        };

        Ok(ServerRecord {
            id: row.get(0)?,
            user_id: row.get(1)?,
            fields,
            created_at: row.get(3)?,
            updated_at: row.get(4)?,
            sync_version: row.get(5)?,
        })
    }

    fn not_found(&self, id: &str) -> Error {
        Error::NotFound(format!("{} record {id}", self.resource_type))
    }
}

#[async_trait]
impl ResourceAdapter for LibSqlRecordAdapter {
    async fn create(&self, user_id: &str, fields: &Map<String, Value>) -> Result<ServerRecord> {
        let now = now_millis();
        let record = ServerRecord {
            id: Uuid::now_v7().to_string(),
            user_id: user_id.to_string(),
            fields: fields.clone(),
            created_at: now,
            updated_at: now,
            sync_version: 1,
        };

        self.conn
            .execute(
                "INSERT INTO records
                    (resource_type, id, user_id, fields, created_at, updated_at, sync_version, is_deleted)
                 VALUES (?, ?, ?, ?, ?, ?, ?, 0)",
                params![
                    self.resource_type.as_str(),
                    record.id.as_str(),
                    record.user_id.as_str(),
                    serde_json::to_string(&record.fields)?,
                    record.created_at,
                    record.updated_at,
                    record.sync_version
                ],
            )
            .await?;

        Ok(record)
    }

    async fn fetch(&self, id: &str) -> Result<Option<ServerRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, user_id, fields, created_at, updated_at, sync_version
                 FROM records
                 WHERE resource_type = ? AND id = ? AND is_deleted = 0",
                params![self.resource_type.as_str(), id],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_record(&row)?)),
            None => Ok(None),
        }
    }

    async fn apply_update(
        &self,
        id: &str,
        fields: &Map<String, Value>,
        new_sync_version: i64,
    ) -> Result<ServerRecord> {
        let mut record = self.fetch(id).await?.ok_or_else(|| self.not_found(id))?;
        let expected = new_sync_version - 1;
        if record.sync_version != expected {
            return Err(Error::VersionMismatch {
                id: id.to_string(),
                expected,
                actual: record.sync_version,
            });
        }

        for (name, value) in fields {
            record.fields.insert(name.clone(), value.clone());
        }
        record.updated_at = now_millis().max(record.updated_at);
        record.sync_version = new_sync_version;

        let rows = self
            .conn
            .execute(
                "UPDATE records
                 SET fields = ?, updated_at = ?, sync_version = ?
                 WHERE resource_type = ? AND id = ? AND sync_version = ? AND is_deleted = 0",
                params![
                    serde_json::to_string(&record.fields)?,
                    record.updated_at,
                    record.sync_version,
                    self.resource_type.as_str(),
                    id,
                    expected
                ],
            )
            .await?;

        if rows == 0 {
            // Lost a race with another writer between fetch and update
            let current = self.fetch(id).await?.ok_or_else(|| self.not_found(id))?;
            return Err(Error::VersionMismatch {
                id: id.to_string(),
                expected,
                actual: current.sync_version,
            });
        }

        Ok(record)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let rows = self
            .conn
            .execute(
                "UPDATE records
                 SET is_deleted = 1, updated_at = ?, sync_version = sync_version + 1
                 WHERE resource_type = ? AND id = ? AND is_deleted = 0",
                params![now_millis(), self.resource_type.as_str(), id],
            )
            .await?;

        if rows == 0 {
            return Err(self.not_found(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    async fn setup() -> (Database, LibSqlRecordAdapter) {
        let db = Database::open_in_memory().await.unwrap();
        let adapter = LibSqlRecordAdapter::new(db.connection(), "expenses");
        (db, adapter)
    }

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("test fields must be an object"),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_create_and_fetch() {
        let (_db, adapter) = setup().await;

        let created = adapter
            .create("user-1", &fields(json!({"amount": 100, "label": "rent"})))
            .await
            .unwrap();
        assert_eq!(created.sync_version, 1);
        assert_eq!(created.created_at, created.updated_at);

        let fetched = adapter.fetch(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_resource_types_are_isolated() {
        let (db, adapter) = setup().await;
        let other = LibSqlRecordAdapter::new(db.connection(), "goals");

        let created = adapter
            .create("user-1", &fields(json!({"amount": 1})))
            .await
            .unwrap();
        assert!(other.fetch(&created.id).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_apply_update_merges_and_bumps_version() {
        let (_db, adapter) = setup().await;
        let created = adapter
            .create("user-1", &fields(json!({"amount": 100, "label": "rent"})))
            .await
            .unwrap();

        let updated = adapter
            .apply_update(&created.id, &fields(json!({"amount": 150})), 2)
            .await
            .unwrap();
        assert_eq!(updated.sync_version, 2);
        assert_eq!(updated.fields["amount"], json!(150));
        assert_eq!(updated.fields["label"], json!("rent"));
        assert!(updated.updated_at >= created.updated_at);

        let stored = adapter.fetch(&created.id).await.unwrap().unwrap();
        assert_eq!(stored, updated);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_apply_update_rejects_stale_version() {
        let (_db, adapter) = setup().await;
        let created = adapter
            .create("user-1", &fields(json!({"amount": 100})))
            .await
            .unwrap();

        let err = adapter
            .apply_update(&created.id, &fields(json!({"amount": 1})), 5)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::VersionMismatch {
                expected: 4,
                actual: 1,
                ..
            }
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_apply_update_missing_record() {
        let (_db, adapter) = setup().await;
        let err = adapter
            .apply_update("nope", &Map::new(), 2)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_delete_then_delete_again() {
        let (_db, adapter) = setup().await;
        let created = adapter
            .create("user-1", &fields(json!({"amount": 100})))
            .await
            .unwrap();

        adapter.delete(&created.id).await.unwrap();
        assert!(adapter.fetch(&created.id).await.unwrap().is_none());
        assert!(adapter.list_for_user("user-1", 10).await.unwrap().is_empty());

        let err = adapter.delete(&created.id).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
