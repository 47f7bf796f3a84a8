//! Conflict and resolution strategy models

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Which side's value a conflicting field kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Client,
    Server,
}

impl Resolution {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Server => "server",
        }
    }
}

impl FromStr for Resolution {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(Self::Client),
            "server" => Ok(Self::Server),
            other => Err(Error::InvalidInput(format!("unknown resolution '{other}'"))),
        }
    }
}

/// One diverging field between a queued change and the server record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    pub field: String,
    pub client_value: Value,
    pub server_value: Value,
    /// Filled in by the resolver
    pub resolution: Option<Resolution>,
}

impl Conflict {
    pub fn new(field: impl Into<String>, client_value: Value, server_value: Value) -> Self {
        Self {
            field: field.into(),
            client_value,
            server_value,
            resolution: None,
        }
    }

    /// Value persisted for this field given its resolution
    pub fn resolved_value(&self) -> Option<&Value> {
        match self.resolution {
            Some(Resolution::Client) => Some(&self.client_value),
            Some(Resolution::Server) => Some(&self.server_value),
            None => None,
        }
    }
}

/// Conflict resolution policy, passed explicitly on every drain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictStrategy {
    /// Client value wins
    ClientWins,
    /// Server value is kept
    ServerWins,
    /// Incoming client intent wins, even though the server wrote last
    LastWriteWins,
    /// Server value is kept and conflicts are surfaced for human review
    Manual,
}

impl ConflictStrategy {
    pub const ALL: [Self; 4] = [
        Self::ClientWins,
        Self::ServerWins,
        Self::LastWriteWins,
        Self::Manual,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ClientWins => "client-wins",
            Self::ServerWins => "server-wins",
            Self::LastWriteWins => "last-write-wins",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for ConflictStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConflictStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == normalized)
            .ok_or_else(|| {
                Error::InvalidInput(format!(
                    "unknown conflict strategy '{normalized}' (expected client-wins, server-wins, last-write-wins or manual)"
                ))
            })
    }
}

/// Audit row for a resolved field conflict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictLogEntry {
    /// Conflict row identifier
    pub id: i64,
    pub change_id: String,
    pub user_id: String,
    pub resource_type: String,
    pub record_id: String,
    pub field: String,
    pub client_value: Value,
    pub server_value: Value,
    pub resolution: Resolution,
    pub strategy: ConflictStrategy,
    /// Set for conflicts surfaced under the manual strategy
    pub needs_review: bool,
    /// Resolution timestamp (unix ms)
    pub resolved_at: i64,
}
