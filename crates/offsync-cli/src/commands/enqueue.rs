use std::path::Path;

use offsync_core::models::{ChangeAction, ChangePayload, NewChange};
use offsync_core::EngineConfig;

use crate::commands::common::{normalize_user_id, open_service};
use crate::error::CliError;

pub struct EnqueueArgs {
    pub user: String,
    pub resource: String,
    pub action: ChangeAction,
    pub payload: String,
    pub client: String,
    pub captured_at: Option<i64>,
}

pub fn parse_payload(raw: &str) -> Result<ChangePayload, CliError> {
    let value: serde_json::Value = serde_json::from_str(raw.trim())
        .map_err(|error| CliError::InvalidPayload(error.to_string()))?;
    if !value.is_object() {
        return Err(CliError::InvalidPayload(
            "payload must be a JSON object".to_string(),
        ));
    }
    serde_json::from_value(value).map_err(|error| CliError::InvalidPayload(error.to_string()))
}

pub fn build_change(args: &EnqueueArgs) -> Result<NewChange, CliError> {
    let user_id = normalize_user_id(&args.user)?;
    let payload = parse_payload(&args.payload)?;
    if args.action != ChangeAction::Create && payload.id.is_none() {
        return Err(CliError::InvalidPayload(format!(
            "{} payload needs an \"id\"",
            args.action
        )));
    }

    let change = NewChange::new(
        user_id,
        args.resource.trim(),
        args.action,
        payload,
        args.client.trim(),
    );
    Ok(match args.captured_at {
        Some(timestamp_ms) => change.captured_at(timestamp_ms),
        None => change,
    })
}

pub async fn run_enqueue(
    args: &EnqueueArgs,
    config: &EngineConfig,
    db_path: &Path,
) -> Result<(), CliError> {
    let change = build_change(args)?;
    let service = open_service(config, db_path).await?;
    let id = service.enqueue(&change).await?;
    println!("Queued {} {} change {id}", change.resource_type, change.action);
    Ok(())
}
