use std::path::{Path, PathBuf};

use offsync_core::models::{
    ConflictLogEntry, PendingChange, ServerRecord, SyncResult, SyncStatusCounts,
};
use offsync_core::{EngineConfig, SyncService};
use serde::Serialize;
use serde_json::Value;

use crate::error::CliError;

const VALUE_PREVIEW_CHARS: usize = 40;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeListItem {
    pub id: String,
    pub resource_type: String,
    pub action: String,
    pub status: String,
    pub client_id: String,
    pub enqueued_at: i64,
    pub enqueued_at_iso: String,
    pub processed_at: Option<i64>,
    pub server_id: Option<String>,
    pub error: Option<String>,
    pub payload: Value,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictItem {
    pub id: i64,
    pub change_id: String,
    pub resource_type: String,
    pub record_id: String,
    pub field: String,
    pub client_value: Value,
    pub server_value: Value,
    pub resolution: String,
    pub strategy: String,
    pub needs_review: bool,
    pub resolved_at: i64,
    pub resolved_at_iso: String,
}

pub fn load_engine_config() -> Result<EngineConfig, CliError> {
    Ok(EngineConfig::from_env()?)
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>, config: &EngineConfig) -> PathBuf {
    cli_db_path
        .or_else(|| config.db_path.clone())
        .unwrap_or_else(default_db_path)
}

pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("offsync")
        .join("offsync.db")
}

pub async fn open_service(config: &EngineConfig, db_path: &Path) -> Result<SyncService, CliError> {
    tracing::debug!("Opening database at {}", db_path.display());
    Ok(SyncService::open_path(db_path, config).await?)
}

pub fn normalize_user_id(user_id: &str) -> Result<&str, CliError> {
    let trimmed = user_id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyUserId)
    } else {
        Ok(trimmed)
    }
}

pub fn change_to_item(change: &PendingChange) -> ChangeListItem {
    ChangeListItem {
        id: change.id.to_string(),
        resource_type: change.resource_type.clone(),
        action: change.action.to_string(),
        status: change.status.to_string(),
        client_id: change.client_id.clone(),
        enqueued_at: change.enqueued_at,
        enqueued_at_iso: format_timestamp(change.enqueued_at),
        processed_at: change.processed_at,
        server_id: change.server_id.clone(),
        error: change.error.clone(),
        payload: serde_json::to_value(&change.payload).unwrap_or(Value::Null),
    }
}

pub fn conflict_to_item(entry: &ConflictLogEntry) -> ConflictItem {
    ConflictItem {
        id: entry.id,
        change_id: entry.change_id.clone(),
        resource_type: entry.resource_type.clone(),
        record_id: entry.record_id.clone(),
        field: entry.field.clone(),
        client_value: entry.client_value.clone(),
        server_value: entry.server_value.clone(),
        resolution: entry.resolution.as_str().to_string(),
        strategy: entry.strategy.to_string(),
        needs_review: entry.needs_review,
        resolved_at: entry.resolved_at,
        resolved_at_iso: format_timestamp(entry.resolved_at),
    }
}

pub fn format_result_lines(results: &[SyncResult]) -> Vec<String> {
    results
        .iter()
        .map(|result| {
            let mut line = format!(
                "{}  {}",
                result.change_id,
                if result.success { "ok    " } else { "FAILED" }
            );
            if let Some(kind) = result.failure {
                line.push_str(&format!("  {}", kind.as_str()));
            }
            if let Some(error) = &result.error {
                line.push_str(&format!(": {error}"));
            }
            if !result.conflicts.is_empty() {
                let fields = result
                    .conflicts
                    .iter()
                    .map(|conflict| conflict.field.as_str())
                    .collect::<Vec<_>>()
                    .join(",");
                line.push_str(&format!("  conflicts={fields}"));
                if result.unresolved {
                    line.push_str(" (needs review)");
                }
            }
            if let Some(remap) = &result.remap {
                line.push_str(&format!("  {} -> {}", remap.temp_id, remap.server_id));
            }
            line
        })
        .collect()
}

pub fn format_drain_summary(results: &[SyncResult]) -> String {
    let failed = results.iter().filter(|result| !result.success).count();
    let conflicted = results
        .iter()
        .filter(|result| !result.conflicts.is_empty())
        .count();
    format!(
        "Processed {} change(s): {} ok, {failed} failed, {conflicted} with conflicts",
        results.len(),
        results.len() - failed
    )
}

pub fn format_status_line(counts: &SyncStatusCounts) -> String {
    format!(
        "pending={}  completed={}  failed={}  total={}",
        counts.pending, counts.completed, counts.failed, counts.total
    )
}

pub fn format_change_lines(changes: &[PendingChange], now_ms: i64) -> Vec<String> {
    changes
        .iter()
        .map(|change| {
            let mut line = format!(
                "{}  {:<9}  {:<6}  {:<10}  {}",
                change.id,
                change.status.as_str(),
                change.action.as_str(),
                change.resource_type,
                format_relative_time(change.enqueued_at, now_ms)
            );
            if let Some(error) = &change.error {
                line.push_str(&format!("  error: {error}"));
            }
            line
        })
        .collect()
}

pub fn format_conflict_lines(conflicts: &[ConflictLogEntry]) -> Vec<String> {
    conflicts
        .iter()
        .map(|entry| {
            format!(
                "{}  {:<15}  {}/{}  {}: client={} server={} -> {}{}",
                format_timestamp(entry.resolved_at),
                entry.strategy.as_str(),
                entry.resource_type,
                entry.record_id,
                entry.field,
                value_preview(&entry.client_value),
                value_preview(&entry.server_value),
                entry.resolution.as_str(),
                if entry.needs_review { "  [review]" } else { "" }
            )
        })
        .collect()
}

pub fn format_record_lines(records: &[ServerRecord]) -> Vec<String> {
    records
        .iter()
        .map(|record| {
            format!(
                "{}  v{}  {}  {}",
                record.id,
                record.sync_version,
                format_timestamp(record.updated_at),
                value_preview(&Value::Object(record.fields.clone()))
            )
        })
        .collect()
}

pub fn value_preview(value: &Value) -> String {
    let rendered = value.to_string();
    if rendered.chars().count() <= VALUE_PREVIEW_CHARS {
        rendered
    } else {
        let take_len = VALUE_PREVIEW_CHARS.saturating_sub(3);
        let mut truncated = rendered.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else {
        format!("{}d ago", diff / day)
    }
}
