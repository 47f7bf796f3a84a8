use std::path::Path;

use offsync_core::EngineConfig;

use crate::commands::common::{format_status_line, normalize_user_id, open_service};
use crate::error::CliError;

pub async fn run_status(
    user_id: &str,
    as_json: bool,
    config: &EngineConfig,
    db_path: &Path,
) -> Result<(), CliError> {
    let user_id = normalize_user_id(user_id)?;
    let service = open_service(config, db_path).await?;
    let counts = service.status(user_id).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&counts)?);
    } else {
        println!("{}", format_status_line(&counts));
    }
    Ok(())
}

pub async fn run_purge(
    user_id: &str,
    older_than: Option<i64>,
    config: &EngineConfig,
    db_path: &Path,
) -> Result<(), CliError> {
    let user_id = normalize_user_id(user_id)?;
    let service = open_service(config, db_path).await?;
    let purged = service.purge_completed(user_id, older_than).await?;
    println!("Purged {purged} completed change(s)");
    Ok(())
}
