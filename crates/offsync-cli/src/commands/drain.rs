use std::path::Path;

use offsync_core::models::{ConflictStrategy, SyncResult};
use offsync_core::EngineConfig;

use crate::commands::common::{
    format_drain_summary, format_result_lines, normalize_user_id, open_service,
};
use crate::error::CliError;

pub async fn run_drain(
    user_id: &str,
    strategy: ConflictStrategy,
    as_json: bool,
    config: &EngineConfig,
    db_path: &Path,
) -> Result<(), CliError> {
    let user_id = normalize_user_id(user_id)?;
    let service = open_service(config, db_path).await?;
    let results = service.drain(user_id, strategy).await?;
    tracing::debug!(user_id, strategy = %strategy, processed = results.len(), "Drain command finished");
    print_results(&results, as_json)
}

pub async fn run_retry(
    user_id: &str,
    strategy: ConflictStrategy,
    as_json: bool,
    config: &EngineConfig,
    db_path: &Path,
) -> Result<(), CliError> {
    let user_id = normalize_user_id(user_id)?;
    let service = open_service(config, db_path).await?;
    let results = service.retry(user_id, strategy).await?;
    tracing::debug!(user_id, strategy = %strategy, processed = results.len(), "Retry command finished");
    print_results(&results, as_json)
}

fn print_results(results: &[SyncResult], as_json: bool) -> Result<(), CliError> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No pending changes.");
        return Ok(());
    }

    for line in format_result_lines(results) {
        println!("{line}");
    }
    println!("{}", format_drain_summary(results));
    Ok(())
}
