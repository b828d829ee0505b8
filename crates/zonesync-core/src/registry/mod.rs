//! Plugin-based adapter registry
//!
//! The registry lets IP resolvers and zone record sources be registered by
//! name at startup, so the daemon builds them from configuration instead of
//! hard-coding each implementation.
//!
//! ## Registration
//!
//! Adapter crates expose a `register` function:
//!
//! ```rust,ignore
//! // In zonesync-provider-cloudflare
//! pub fn register(registry: &AdapterRegistry) {
//!     registry.register_zone_source("cloudflare", Box::new(CloudflareFactory));
//! }
//! ```

use crate::config::{ProviderConfig, ResolverConfig};
use crate::error::{Error, Result};
use crate::traits::{IpResolver, IpResolverFactory, ZoneRecordSource, ZoneRecordSourceFactory};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Registry of adapter factories keyed by type name
///
/// Uses interior mutability with RwLock, allowing concurrent reads and
/// exclusive writes.
#[derive(Default)]
pub struct AdapterRegistry {
    /// Registered zone record source factories
    zone_sources: RwLock<HashMap<String, Box<dyn ZoneRecordSourceFactory>>>,

    /// Registered IP resolver factories
    resolvers: RwLock<HashMap<String, Box<dyn IpResolverFactory>>>,
}

impl AdapterRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a zone record source factory
    ///
    /// # Parameters
    ///
    /// - `name`: Provider type name (e.g., "cloudflare")
    /// - `factory`: Factory object for creating source instances
    pub fn register_zone_source(
        &self,
        name: impl Into<String>,
        factory: Box<dyn ZoneRecordSourceFactory>,
    ) {
        let mut sources = self
            .zone_sources
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        sources.insert(name.into(), factory);
    }

    /// Register an IP resolver factory
    ///
    /// # Parameters
    ///
    /// - `name`: Resolver type name (e.g., "http")
    /// - `factory`: Factory object for creating resolver instances
    pub fn register_resolver(&self, name: impl Into<String>, factory: Box<dyn IpResolverFactory>) {
        let mut resolvers = self
            .resolvers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        resolvers.insert(name.into(), factory);
    }

    /// Create a zone record source from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn ZoneRecordSource>)`: Created source instance
    /// - `Err(Error::Config)`: If the type is not registered or creation fails
    pub fn create_zone_source(&self, config: &ProviderConfig) -> Result<Box<dyn ZoneRecordSource>> {
        let provider_type = config.type_name();
        let sources = self
            .zone_sources
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        let factory = sources
            .get(provider_type)
            .ok_or_else(|| Error::config(format!("Unknown provider type: {}", provider_type)))?;

        factory.create(config)
    }

    /// Create an IP resolver from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn IpResolver>)`: Created resolver instance
    /// - `Err(Error::Config)`: If the type is not registered or creation fails
    pub fn create_resolver(&self, config: &ResolverConfig) -> Result<Box<dyn IpResolver>> {
        let resolver_type = config.type_name();
        let resolvers = self
            .resolvers
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        let factory = resolvers
            .get(resolver_type)
            .ok_or_else(|| Error::config(format!("Unknown resolver type: {}", resolver_type)))?;

        factory.create(config)
    }

    /// List all registered provider types
    pub fn list_zone_sources(&self) -> Vec<String> {
        let sources = self
            .zone_sources
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        sources.keys().cloned().collect()
    }

    /// List all registered resolver types
    pub fn list_resolvers(&self) -> Vec<String> {
        let resolvers = self
            .resolvers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        resolvers.keys().cloned().collect()
    }

    /// Check if a provider type is registered
    pub fn has_zone_source(&self, name: &str) -> bool {
        let sources = self
            .zone_sources
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        sources.contains_key(name)
    }

    /// Check if a resolver type is registered
    pub fn has_resolver(&self, name: &str) -> bool {
        let resolvers = self
            .resolvers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        resolvers.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CloudflareCredentials;

    struct MockSourceFactory;

    impl ZoneRecordSourceFactory for MockSourceFactory {
        fn create(&self, _config: &ProviderConfig) -> Result<Box<dyn ZoneRecordSource>> {
            Err(Error::config("Mock source not implemented"))
        }
    }

    #[test]
    fn test_registry_registration() {
        let registry = AdapterRegistry::new();

        assert!(!registry.has_zone_source("mock"));

        registry.register_zone_source("mock", Box::new(MockSourceFactory));

        assert!(registry.has_zone_source("mock"));
        assert!(registry.list_zone_sources().contains(&"mock".to_string()));
        assert!(registry.list_resolvers().is_empty());
    }

    #[test]
    fn unknown_types_are_config_errors() {
        let registry = AdapterRegistry::new();

        let provider = ProviderConfig::Cloudflare {
            credentials: CloudflareCredentials::ApiToken {
                token: "tok".to_string(),
            },
            base_url: None,
            dry_run: false,
        };
        let err = registry.create_zone_source(&provider).err();
        assert!(matches!(err, Some(Error::Config(msg)) if msg.contains("cloudflare")));

        let err = registry.create_resolver(&ResolverConfig::default()).err();
        assert!(matches!(err, Some(Error::Config(msg)) if msg.contains("http")));
    }
}
