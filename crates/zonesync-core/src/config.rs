//! Configuration types for zonesync
//!
//! Configuration is built once at startup, validated, and then only ever
//! read. A validation failure is the one fatal error in the system.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default "what is my IP" endpoint
pub const DEFAULT_RESOLVER_URL: &str = "https://ifconfig.me/ip";

/// Complete daemon configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// What to reconcile and how often
    pub reconcile: ReconcileConfig,

    /// Public IP resolver configuration
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// DNS provider configuration
    pub provider: ProviderConfig,

    /// Optional scheduler settings
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

impl DaemonConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.reconcile.validate()?;
        self.resolver.validate()?;
        self.provider.validate()?;
        self.scheduler.validate()?;
        Ok(())
    }
}

/// The reconciliation target and cadence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Provider zone identifier (opaque)
    pub zone_id: String,

    /// Record name to reconcile, matched exactly
    pub record_name: String,

    /// Seconds between cycles
    pub poll_interval_secs: u64,

    /// Per-cycle time budget in seconds (defaults to the poll interval)
    #[serde(default)]
    pub cycle_timeout_secs: Option<u64>,
}

impl ReconcileConfig {
    /// Create a configuration whose cycle budget equals the poll interval
    pub fn new(
        zone_id: impl Into<String>,
        record_name: impl Into<String>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            zone_id: zone_id.into(),
            record_name: record_name.into(),
            poll_interval_secs: poll_interval.as_secs(),
            cycle_timeout_secs: None,
        }
    }

    /// Set a per-cycle budget shorter than the poll interval
    pub fn with_cycle_timeout(mut self, timeout: Duration) -> Self {
        self.cycle_timeout_secs = Some(timeout.as_secs());
        self
    }

    /// Time to sleep between cycles
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Deadline budget for a single cycle
    pub fn cycle_budget(&self) -> Duration {
        Duration::from_secs(self.cycle_timeout_secs.unwrap_or(self.poll_interval_secs))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.zone_id.trim().is_empty() {
            return Err(crate::Error::config("Zone ID is required"));
        }
        if self.record_name.trim().is_empty() {
            return Err(crate::Error::config("Record name is required"));
        }
        if self.poll_interval_secs == 0 {
            return Err(crate::Error::config("Poll interval must be > 0"));
        }
        if let Some(timeout) = self.cycle_timeout_secs {
            if timeout == 0 {
                return Err(crate::Error::config("Cycle timeout must be > 0"));
            }
            if timeout > self.poll_interval_secs {
                return Err(crate::Error::config(format!(
                    "Cycle timeout ({}s) cannot exceed the poll interval ({}s)",
                    timeout, self.poll_interval_secs
                )));
            }
        }
        Ok(())
    }
}

/// Public IP resolver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResolverConfig {
    /// Plain-text HTTP lookup
    Http {
        /// URL returning the caller's address as the whole body
        url: String,
        /// Address family to accept
        #[serde(default)]
        version: Option<IpVersion>,
    },

    /// Custom resolver
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ResolverConfig {
    /// Validate the resolver configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ResolverConfig::Http { url, .. } => {
                if url.is_empty() {
                    return Err(crate::Error::config("Resolver URL cannot be empty"));
                }
                if !url.starts_with("https://") && !url.starts_with("http://") {
                    return Err(crate::Error::config(format!(
                        "Resolver URL must use http or https: {}",
                        url
                    )));
                }
                Ok(())
            }
            ResolverConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config("Custom resolver factory cannot be empty"));
                }
                if config.is_null() {
                    return Err(crate::Error::config("Custom resolver config cannot be null"));
                }
                Ok(())
            }
        }
    }

    /// Get the resolver type name
    pub fn type_name(&self) -> &str {
        match self {
            ResolverConfig::Http { .. } => "http",
            ResolverConfig::Custom { factory, .. } => factory,
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig::Http {
            url: DEFAULT_RESOLVER_URL.to_string(),
            version: None,
        }
    }
}

/// Address family filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpVersion {
    /// IPv4 only
    V4,
    /// IPv6 only
    V6,
    /// Either family
    Both,
}

impl IpVersion {
    /// Whether `ip` belongs to this family
    pub fn accepts(&self, ip: &std::net::IpAddr) -> bool {
        match self {
            IpVersion::V4 => ip.is_ipv4(),
            IpVersion::V6 => ip.is_ipv6(),
            IpVersion::Both => true,
        }
    }
}

impl std::str::FromStr for IpVersion {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "v4" | "4" | "ipv4" => Ok(IpVersion::V4),
            "v6" | "6" | "ipv6" => Ok(IpVersion::V6),
            "both" | "any" => Ok(IpVersion::Both),
            other => Err(crate::Error::config(format!(
                "Unknown IP version '{}'. Valid: v4, v6, both",
                other
            ))),
        }
    }
}

/// DNS provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Cloudflare API v4
    Cloudflare {
        /// API credentials
        credentials: CloudflareCredentials,
        /// API base URL override
        #[serde(default)]
        base_url: Option<String>,
        /// Log updates instead of sending them
        #[serde(default)]
        dry_run: bool,
    },

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Cloudflare {
                credentials,
                base_url,
                ..
            } => {
                credentials.validate()?;
                if let Some(url) = base_url
                    && !url.starts_with("https://")
                    && !url.starts_with("http://")
                {
                    return Err(crate::Error::config(format!(
                        "Cloudflare base URL must use http or https: {}",
                        url
                    )));
                }
                Ok(())
            }
            ProviderConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config("Custom provider factory cannot be empty"));
                }
                if config.is_null() {
                    return Err(crate::Error::config("Custom provider config cannot be null"));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Cloudflare { .. } => "cloudflare",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }
}

/// Cloudflare authentication
///
/// The Debug implementation never prints secret values.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CloudflareCredentials {
    /// Scoped API token (preferred)
    ApiToken {
        /// The token
        token: String,
    },
    /// Global API key with the account email
    GlobalKey {
        /// The global API key
        key: String,
        /// The account email
        email: String,
    },
}

impl CloudflareCredentials {
    /// Validate that no credential field is empty
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            CloudflareCredentials::ApiToken { token } => {
                if token.trim().is_empty() {
                    return Err(crate::Error::config("Cloudflare API token cannot be empty"));
                }
            }
            CloudflareCredentials::GlobalKey { key, email } => {
                if key.trim().is_empty() {
                    return Err(crate::Error::config("Cloudflare API key cannot be empty"));
                }
                if email.trim().is_empty() {
                    return Err(crate::Error::config(
                        "Cloudflare API email is required with an API key",
                    ));
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for CloudflareCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloudflareCredentials::ApiToken { .. } => f
                .debug_struct("ApiToken")
                .field("token", &"<REDACTED>")
                .finish(),
            CloudflareCredentials::GlobalKey { email, .. } => f
                .debug_struct("GlobalKey")
                .field("key", &"<REDACTED>")
                .field("email", email)
                .finish(),
        }
    }
}

/// Scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Capacity of the scheduler event channel
    ///
    /// When full, events are dropped with a warning; the loop never blocks
    /// on observers.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl SchedulerConfig {
    /// Validate the scheduler configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_event_channel_capacity() -> usize {
    100
}
