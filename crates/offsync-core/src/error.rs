//! Error types for offsync-core

use thiserror::Error;

/// Result type alias using offsync-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in offsync-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Record or change not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No adapter is registered for the resource type
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// Optimistic version check failed on a record write
    #[error("Version mismatch on {id}: expected sync version {expected}, found {actual}")]
    VersionMismatch {
        id: String,
        expected: i64,
        actual: i64,
    },

    /// Another drain holds the user's queue
    #[error("A drain is already running for user {0}")]
    DrainInProgress(String),

    /// Invalid engine configuration
    #[error("Configuration error: {0}")]
    Config(String),
}
