// # IP Resolver Trait
//
// Defines the interface for discovering the caller's current public IP.
//
// ## Implementations
//
// - HTTP lookup ("what is my IP" endpoints): `zonesync-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use std::time::Duration;
// use zonesync_core::{CycleContext, IpResolver};
//
// let resolver = /* IpResolver implementation */;
// let ctx = CycleContext::new(1, Duration::from_secs(30));
// let ip = resolver.resolve(&ctx).await?;
// ```

use crate::context::CycleContext;
use async_trait::async_trait;
use std::net::IpAddr;

/// Trait for public IP resolvers
///
/// A resolver is an **observer**: it reports the address it sees and nothing
/// else. It never decides whether a record needs updating.
///
/// # Contract
///
/// - One outbound lookup per call, no internal retry. The next scheduled
///   cycle is the retry.
/// - Responses must be validated: leading and trailing whitespace is
///   stripped and the remainder must parse as an IP address.
/// - Transport failures, non-success statuses, unparsable bodies and an
///   expired `ctx` deadline are all reported as [`crate::Error::Resolution`].
/// - No caching between calls; every cycle observes a fresh address.
#[async_trait]
pub trait IpResolver: Send + Sync {
    /// Resolve the current public IP address
    ///
    /// # Parameters
    ///
    /// - `ctx`: The current cycle context; the lookup must finish before its deadline
    ///
    /// # Returns
    ///
    /// - `Ok(IpAddr)`: The observed public address
    /// - `Err(Error::Resolution)`: If the address could not be determined
    async fn resolve(&self, ctx: &CycleContext) -> Result<IpAddr, crate::Error>;

    /// Get the resolver name (for logging/debugging)
    fn resolver_name(&self) -> &'static str;
}

/// Helper trait for constructing IP resolvers from configuration
pub trait IpResolverFactory: Send + Sync {
    /// Create an IpResolver instance from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Resolver configuration
    ///
    /// # Returns
    ///
    /// A boxed IpResolver trait object
    fn create(
        &self,
        config: &crate::config::ResolverConfig,
    ) -> Result<Box<dyn IpResolver>, crate::Error>;
}
