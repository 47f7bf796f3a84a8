//! Engine configuration.
//!
//! Loaded from `OFFSYNC_*` environment variables. Values are trimmed and an
//! empty value counts as unset.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::util::normalize_text_option;

/// Resource types registered with the generic adapter when none are configured
pub const DEFAULT_RESOURCES: &[&str] = &["earnings", "expenses", "goals", "clients", "invoices"];

const MAX_DRAIN_DEADLINE_MS: u64 = 3_600_000;

/// Runtime settings for a `SyncService`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Database file; `None` lets the caller pick a location
    pub db_path: Option<PathBuf>,
    /// Resource types served by the generic record adapter
    pub resources: Vec<String>,
    /// Overall batch deadline for a drain
    pub drain_deadline: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            resources: DEFAULT_RESOURCES.iter().map(ToString::to_string).collect(),
            drain_deadline: None,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let db_path = optional_trimmed(&lookup, "OFFSYNC_DB_PATH").map(PathBuf::from);

        let resources = match optional_trimmed(&lookup, "OFFSYNC_RESOURCES") {
            Some(raw) => parse_resources(&raw)?,
            None => Self::default().resources,
        };

        let drain_deadline = optional_trimmed(&lookup, "OFFSYNC_DRAIN_DEADLINE_MS")
            .map(|raw| {
                let millis = raw.parse::<u64>().map_err(|_| {
                    Error::Config(format!(
                        "OFFSYNC_DRAIN_DEADLINE_MS must be an integer in [1, {MAX_DRAIN_DEADLINE_MS}]"
                    ))
                })?;
                if !(1..=MAX_DRAIN_DEADLINE_MS).contains(&millis) {
                    return Err(Error::Config(format!(
                        "OFFSYNC_DRAIN_DEADLINE_MS must be in [1, {MAX_DRAIN_DEADLINE_MS}]"
                    )));
                }
                Ok(Duration::from_millis(millis))
            })
            .transpose()?;

        Ok(Self {
            db_path,
            resources,
            drain_deadline,
        })
    }
}

fn parse_resources(raw: &str) -> Result<Vec<String>> {
    let mut resources: Vec<String> = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|name| !name.is_empty()) {
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(Error::Config(format!(
                "OFFSYNC_RESOURCES contains invalid resource type '{name}'"
            )));
        }
        if !resources.iter().any(|existing| existing == name) {
            resources.push(name.to_string());
        }
    }

    if resources.is_empty() {
        return Err(Error::Config(
            "OFFSYNC_RESOURCES must name at least one resource type".to_string(),
        ));
    }
    Ok(resources)
}

fn optional_trimmed(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    normalize_text_option(lookup(name))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<EngineConfig> {
        let map: HashMap<&str, &str> = pairs.iter().copied().collect();
        EngineConfig::from_lookup(|key| map.get(key).map(|value| (*value).to_string()))
    }

    #[test]
    fn config_defaults_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.resources.len(), 5);
        assert!(config.drain_deadline.is_none());
    }

    #[test]
    fn config_reads_values() {
        let config = load(&[
            ("OFFSYNC_DB_PATH", " /tmp/offsync.db "),
            ("OFFSYNC_RESOURCES", "earnings, goals,earnings"),
            ("OFFSYNC_DRAIN_DEADLINE_MS", "2500"),
        ])
        .unwrap();

        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/offsync.db")));
        assert_eq!(config.resources, vec!["earnings", "goals"]);
        assert_eq!(config.drain_deadline, Some(Duration::from_millis(2500)));
    }

    #[test]
    fn config_blank_values_are_unset() {
        let config = load(&[("OFFSYNC_DB_PATH", "  "), ("OFFSYNC_DRAIN_DEADLINE_MS", "")]).unwrap();
        assert!(config.db_path.is_none());
        assert!(config.drain_deadline.is_none());
    }

    #[test]
    fn config_rejects_out_of_range_deadline() {
        for raw in ["0", "3600001", "soon"] {
            let err = load(&[("OFFSYNC_DRAIN_DEADLINE_MS", raw)]).unwrap_err();
            assert!(err.to_string().contains("OFFSYNC_DRAIN_DEADLINE_MS"));
        }
    }

    #[test]
    fn config_rejects_bad_resources() {
        assert!(load(&[("OFFSYNC_RESOURCES", " , ,")]).is_err());
        assert!(load(&[("OFFSYNC_RESOURCES", "earnings;drop")]).is_err());
    }
}
