// # HTTP IP Resolver
//
// This crate provides the HTTP-based public IP resolver for zonesync.
//
// ## Architecture
//
// One plain GET per call to a "what is my IP" service (ifconfig.me,
// icanhazip.com, api.ipify.org, ...). The whole response body is the
// address, possibly surrounded by whitespace.
//
// The resolver never retries and never caches: the scheduler calls it once
// per cycle and a failed cycle is simply retried at the next interval.

use zonesync_core::config::{IpVersion, ResolverConfig};
use zonesync_core::traits::{IpResolver, IpResolverFactory};
use zonesync_core::{AdapterRegistry, CycleContext, Error, Result};

use std::net::IpAddr;
use std::time::Duration;

/// Connection establishment timeout (the request itself is bounded by the cycle)
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP-based public IP resolver
#[derive(Debug)]
pub struct HttpIpResolver {
    /// URL to fetch the address from
    url: String,

    /// Accepted address family (None = either)
    version: Option<IpVersion>,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpResolver {
    /// Create a new HTTP resolver
    ///
    /// # Parameters
    ///
    /// - `url`: URL to fetch the IP from (e.g., "https://ifconfig.me/ip")
    /// - `version`: Address family to accept (None = either)
    pub fn new(url: impl Into<String>, version: Option<IpVersion>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(concat!("zonesync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            version,
            client,
        })
    }

    /// The URL this resolver queries
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl IpResolver for HttpIpResolver {
    async fn resolve(&self, ctx: &CycleContext) -> Result<IpAddr> {
        let budget = ctx.remaining();
        if budget.is_zero() {
            return Err(Error::resolution("cycle deadline exceeded before lookup"));
        }

        tracing::debug!(url = %self.url, ?budget, "Fetching public IP");

        let response = self
            .client
            .get(&self.url)
            .timeout(budget)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::resolution(format!("Request to {} timed out", self.url))
                } else {
                    Error::resolution(format!("Request failed: {}", e))
                }
            })?;

        if !response.status().is_success() {
            return Err(Error::resolution(format!(
                "HTTP error from {}: {}",
                self.url,
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::resolution(format!("Failed to read response: {}", e)))?;

        parse_ip_body(&body, self.version)
    }

    fn resolver_name(&self) -> &'static str {
        "http"
    }
}

/// Parse a response body into an address
///
/// Surrounding whitespace is stripped; anything else must be a bare address
/// of an accepted family.
pub fn parse_ip_body(body: &str, version: Option<IpVersion>) -> Result<IpAddr> {
    let text = body.trim();

    let ip: IpAddr = text
        .parse()
        .map_err(|_| Error::resolution(format!("Invalid IP address: {:?}", text)))?;

    if let Some(version) = version
        && !version.accepts(&ip)
    {
        return Err(Error::resolution(format!(
            "Expected {:?} address, got: {}",
            version, ip
        )));
    }

    Ok(ip)
}

/// Factory for creating HTTP resolvers
pub struct HttpFactory;

impl IpResolverFactory for HttpFactory {
    fn create(&self, config: &ResolverConfig) -> Result<Box<dyn IpResolver>> {
        match config {
            ResolverConfig::Http { url, version } => {
                Ok(Box::new(HttpIpResolver::new(url.clone(), *version)?))
            }
            _ => Err(Error::config("Invalid config for HTTP resolver")),
        }
    }
}

/// Register the HTTP resolver with a registry
pub fn register(registry: &AdapterRegistry) {
    registry.register_resolver("http", Box::new(HttpFactory));
}
