use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use offsync_core::models::{ChangeAction, ChangeStatus, ConflictStrategy};

#[derive(Parser)]
#[command(name = "offsync")]
#[command(about = "Queue, drain and inspect offline changes")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Queue a change captured on a client
    Enqueue {
        /// Owning user
        #[arg(long)]
        user: String,
        /// Resource type, e.g. earnings
        #[arg(long)]
        resource: String,
        /// Mutation kind
        #[arg(long, value_enum)]
        action: ActionArg,
        /// JSON object with `id`, `tempId` and field values
        #[arg(long, default_value = "{}")]
        payload: String,
        /// Originating device
        #[arg(long, default_value = "cli")]
        client: String,
        /// Client capture time in Unix milliseconds (defaults to now)
        #[arg(long, value_name = "MS")]
        captured_at: Option<i64>,
    },
    /// Apply a user's pending changes
    Drain {
        #[arg(long)]
        user: String,
        /// Conflict strategy
        #[arg(long, value_enum)]
        strategy: StrategyArg,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Reset a user's failed changes to pending and drain them
    Retry {
        #[arg(long)]
        user: String,
        /// Conflict strategy
        #[arg(long, value_enum)]
        strategy: StrategyArg,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show queue counts for a user
    Status {
        #[arg(long)]
        user: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List a user's queued changes
    List {
        #[arg(long)]
        user: String,
        /// Only show changes in this state
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
        /// Number of changes to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a user's completed changes
    Purge {
        #[arg(long)]
        user: String,
        /// Only purge changes processed before this Unix ms timestamp
        #[arg(long, value_name = "MS")]
        older_than: Option<i64>,
    },
    /// List recently resolved conflicts
    Conflicts {
        #[arg(long)]
        user: String,
        /// Number of conflicts to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List server records of a resource type
    Records {
        /// Resource type
        resource: String,
        #[arg(long)]
        user: String,
        /// Number of records to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ActionArg {
    Create,
    Update,
    Delete,
}

impl From<ActionArg> for ChangeAction {
    fn from(value: ActionArg) -> Self {
        match value {
            ActionArg::Create => Self::Create,
            ActionArg::Update => Self::Update,
            ActionArg::Delete => Self::Delete,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum StrategyArg {
    ClientWins,
    ServerWins,
    LastWriteWins,
    Manual,
}

impl From<StrategyArg> for ConflictStrategy {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::ClientWins => Self::ClientWins,
            StrategyArg::ServerWins => Self::ServerWins,
            StrategyArg::LastWriteWins => Self::LastWriteWins,
            StrategyArg::Manual => Self::Manual,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum StatusArg {
    Pending,
    Completed,
    Failed,
}

impl From<StatusArg> for ChangeStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Pending => Self::Pending,
            StatusArg::Completed => Self::Completed,
            StatusArg::Failed => Self::Failed,
        }
    }
}
