//! Database migrations

use crate::error::Result;
use libsql::Connection;

/// Current schema version
const CURRENT_VERSION: i32 = 3;

/// Run all pending migrations
pub async fn run(conn: &Connection) -> Result<()> {
    let version = get_version(conn).await?;

    if version < 1 {
        migrate_v1(conn).await?;
    }
    if version < 2 {
        migrate_v2(conn).await?;
    }
    if version < 3 {
        migrate_v3(conn).await?;
    }

    Ok(())
}

/// Get the current schema version
async fn get_version(conn: &Connection) -> Result<i32> {
    let mut rows = conn
        .query(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            (),
        )
        .await?;

    let exists: bool = if let Some(row) = rows.next().await? {
        row.get::<i32>(0)? != 0
    } else {
        false
    };

    if !exists {
        return Ok(0);
    }

    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM schema_version", ())
        .await?;

    let version: i32 = if let Some(row) = rows.next().await? {
        row.get(0)?
    } else {
        0
    };

    Ok(version)
}

/// Run statements inside one transaction, rolling back on the first failure
async fn apply(conn: &Connection, statements: &[&str]) -> Result<()> {
    conn.execute("BEGIN TRANSACTION", ()).await?;

    for stmt in statements {
        if let Err(e) = conn.execute(stmt, ()).await {
            conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }
    }

    if let Err(e) = conn.execute("COMMIT", ()).await {
        conn.execute("ROLLBACK", ()).await.ok();
        return Err(e.into());
    }

    Ok(())
}

/// Migration to version 1: change queue and generic record storage
async fn migrate_v1(conn: &Connection) -> Result<()> {
    apply(
        conn,
        &[
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            )",
            "CREATE TABLE IF NOT EXISTS pending_changes (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                resource_type TEXT NOT NULL,
                action TEXT NOT NULL,
                payload TEXT NOT NULL,
                client_id TEXT NOT NULL,
                enqueued_at INTEGER NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                error TEXT,
                processed_at INTEGER,
                server_id TEXT
            )",
            "CREATE INDEX IF NOT EXISTS idx_pending_changes_queue
                ON pending_changes(user_id, status, enqueued_at, id)",
            "CREATE TABLE IF NOT EXISTS records (
                resource_type TEXT NOT NULL,
                id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                fields TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                sync_version INTEGER NOT NULL DEFAULT 1,
                is_deleted INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (resource_type, id)
            )",
            "CREATE INDEX IF NOT EXISTS idx_records_user ON records(resource_type, user_id)",
            "INSERT INTO schema_version (version) VALUES (1)",
        ],
    )
    .await?;

    tracing::info!("Migrated database to version 1");
    Ok(())
}

/// Migration to version 2: conflict audit log
async fn migrate_v2(conn: &Connection) -> Result<()> {
    apply(
        conn,
        &[
            "CREATE TABLE IF NOT EXISTS sync_conflicts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                change_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                resource_type TEXT NOT NULL,
                record_id TEXT NOT NULL,
                field TEXT NOT NULL,
                client_value TEXT NOT NULL,
                server_value TEXT NOT NULL,
                resolution TEXT NOT NULL,
                strategy TEXT NOT NULL,
                needs_review INTEGER NOT NULL DEFAULT 0,
                resolved_at INTEGER NOT NULL
            )",
            "CREATE INDEX IF NOT EXISTS idx_sync_conflicts_user
                ON sync_conflicts(user_id, resolved_at DESC)",
            "INSERT INTO schema_version (version) VALUES (2)",
        ],
    )
    .await?;

    tracing::info!("Migrated database to version 2");
    Ok(())
}

/// Migration to version 3: durable temp id mappings and per-user drain leases
async fn migrate_v3(conn: &Connection) -> Result<()> {
    apply(
        conn,
        &[
            "CREATE TABLE IF NOT EXISTS temp_id_mappings (
                user_id TEXT NOT NULL,
                temp_id TEXT NOT NULL,
                server_id TEXT NOT NULL,
                resource_type TEXT NOT NULL,
                mapped_at INTEGER NOT NULL,
                PRIMARY KEY (user_id, temp_id)
            )",
            "INSERT OR REPLACE INTO temp_id_mappings
                (user_id, temp_id, server_id, resource_type, mapped_at)
             SELECT user_id, json_extract(payload, '$.tempId'), server_id, resource_type,
                    COALESCE(processed_at, enqueued_at)
             FROM pending_changes
             WHERE action = 'create' AND status = 'completed'
               AND server_id IS NOT NULL
               AND json_extract(payload, '$.tempId') IS NOT NULL
             ORDER BY processed_at ASC",
            "CREATE TABLE IF NOT EXISTS drain_leases (
                user_id TEXT PRIMARY KEY,
                holder TEXT NOT NULL,
                expires_at INTEGER NOT NULL
            )",
            "INSERT INTO schema_version (version) VALUES (3)",
        ],
    )
    .await?;

    tracing::info!("Migrated database to version {CURRENT_VERSION}");
    Ok(())
}
