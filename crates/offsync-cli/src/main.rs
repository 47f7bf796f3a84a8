//! offsync CLI - operator tooling for the offline sync engine
//!
//! Queue changes, drain them with a conflict strategy, and inspect queue state.

mod cli;
mod commands;
mod error;
#[cfg(test)]
mod tests;

use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::commands::common::{load_engine_config, resolve_db_path};
use crate::commands::conflicts::run_conflicts;
use crate::commands::drain::{run_drain, run_retry};
use crate::commands::enqueue::{run_enqueue, EnqueueArgs};
use crate::commands::list::{run_list, run_records};
use crate::commands::status::{run_purge, run_status};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "offsync=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_engine_config()?;
    let db_path = resolve_db_path(cli.db_path, &config);

    match cli.command {
        Commands::Enqueue {
            user,
            resource,
            action,
            payload,
            client,
            captured_at,
        } => {
            let args = EnqueueArgs {
                user,
                resource,
                action: action.into(),
                payload,
                client,
                captured_at,
            };
            run_enqueue(&args, &config, &db_path).await?;
        }
        Commands::Drain {
            user,
            strategy,
            json,
        } => run_drain(&user, strategy.into(), json, &config, &db_path).await?,
        Commands::Retry {
            user,
            strategy,
            json,
        } => run_retry(&user, strategy.into(), json, &config, &db_path).await?,
        Commands::Status { user, json } => run_status(&user, json, &config, &db_path).await?,
        Commands::List {
            user,
            status,
            limit,
            json,
        } => {
            run_list(&user, status.map(Into::into), limit, json, &config, &db_path).await?;
        }
        Commands::Purge { user, older_than } => {
            run_purge(&user, older_than, &config, &db_path).await?;
        }
        Commands::Conflicts { user, limit, json } => {
            run_conflicts(&user, limit, json, &config, &db_path).await?;
        }
        Commands::Records {
            resource,
            user,
            limit,
            json,
        } => run_records(&resource, &user, limit, json, &config, &db_path).await?,
    }

    Ok(())
}
