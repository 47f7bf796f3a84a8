use std::path::Path;

use offsync_core::EngineConfig;

use crate::commands::common::{
    conflict_to_item, format_conflict_lines, normalize_user_id, open_service, ConflictItem,
};
use crate::error::CliError;

pub async fn run_conflicts(
    user_id: &str,
    limit: usize,
    as_json: bool,
    config: &EngineConfig,
    db_path: &Path,
) -> Result<(), CliError> {
    let user_id = normalize_user_id(user_id)?;
    let service = open_service(config, db_path).await?;
    let conflicts = service.list_conflicts(user_id, limit).await?;

    if as_json {
        let json_items = conflicts
            .iter()
            .map(conflict_to_item)
            .collect::<Vec<ConflictItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if conflicts.is_empty() {
        println!("No conflicts recorded.");
        return Ok(());
    }

    for line in format_conflict_lines(&conflicts) {
        println!("{line}");
    }
    Ok(())
}
