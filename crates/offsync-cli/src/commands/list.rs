use std::path::Path;

use offsync_core::models::ChangeStatus;
use offsync_core::EngineConfig;

use crate::commands::common::{
    change_to_item, format_change_lines, format_record_lines, normalize_user_id, open_service,
    ChangeListItem,
};
use crate::error::CliError;

pub async fn run_list(
    user_id: &str,
    status: Option<ChangeStatus>,
    limit: usize,
    as_json: bool,
    config: &EngineConfig,
    db_path: &Path,
) -> Result<(), CliError> {
    let user_id = normalize_user_id(user_id)?;
    let service = open_service(config, db_path).await?;
    let changes = service.list_changes(user_id, status, limit).await?;

    if as_json {
        let json_items = changes
            .iter()
            .map(change_to_item)
            .collect::<Vec<ChangeListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if changes.is_empty() {
        println!("No changes queued.");
    } else {
        let now_ms = chrono::Utc::now().timestamp_millis();
        for line in format_change_lines(&changes, now_ms) {
            println!("{line}");
        }
    }

    Ok(())
}

pub async fn run_records(
    resource_type: &str,
    user_id: &str,
    limit: usize,
    as_json: bool,
    config: &EngineConfig,
    db_path: &Path,
) -> Result<(), CliError> {
    let user_id = normalize_user_id(user_id)?;
    let service = open_service(config, db_path).await?;
    let records = service
        .list_records(resource_type.trim(), user_id, limit)
        .await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else if records.is_empty() {
        println!("No {resource_type} records.");
    } else {
        for line in format_record_lines(&records) {
            println!("{line}");
        }
    }

    Ok(())
}
