//! Resource type to adapter lookup

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::ResourceAdapter;
use crate::error::{Error, Result};

/// Maps resource type names to their adapters.
///
/// Populated once at startup, then shared read-only by every drain.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<String, Arc<dyn ResourceAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the adapter for a resource type
    pub fn register(&mut self, resource_type: impl Into<String>, adapter: Arc<dyn ResourceAdapter>) {
        let resource_type = resource_type.into();
        if self
            .adapters
            .insert(resource_type.clone(), adapter)
            .is_some()
        {
            tracing::warn!("Replaced adapter for resource type {resource_type}");
        }
    }

    /// Builder-style `register`
    #[must_use]
    pub fn with(mut self, resource_type: impl Into<String>, adapter: Arc<dyn ResourceAdapter>) -> Self {
        self.register(resource_type, adapter);
        self
    }

    /// Adapter for a resource type
    pub fn resolve(&self, resource_type: &str) -> Result<Arc<dyn ResourceAdapter>> {
        self.adapters
            .get(resource_type)
            .cloned()
            .ok_or_else(|| Error::UnknownResource(resource_type.to_string()))
    }

    /// Registered resource types, sorted
    pub fn resource_types(&self) -> Vec<&str> {
        let mut types = self.adapters.keys().map(String::as_str).collect::<Vec<_>>();
        types.sort_unstable();
        types
    }
}

impl fmt::Debug for AdapterRegistry {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AdapterRegistry")
            .field("resource_types", &self.resource_types())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, LibSqlRecordAdapter};

    #[tokio::test(flavor = "multi_thread")]
    async fn test_resolve_registered_and_unknown() {
        let db = Database::open_in_memory().await.unwrap();
        let registry = AdapterRegistry::new().with(
            "earnings",
            Arc::new(LibSqlRecordAdapter::new(db.connection(), "earnings")),
        );

        assert!(registry.resolve("earnings").is_ok());
        let err = registry.resolve("invoices").err().unwrap();
        assert!(matches!(err, Error::UnknownResource(ref name) if name == "invoices"));
        assert_eq!(registry.resource_types(), vec!["earnings"]);
    }
}
