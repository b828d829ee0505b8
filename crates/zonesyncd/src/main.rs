// # zonesyncd - zonesync Daemon
//
// This is a thin integration layer. All reconciliation logic lives in
// zonesync-core; the daemon only:
// 1. Parses flags (each also settable from the environment)
// 2. Reads Cloudflare credentials from the environment
// 3. Validates everything before the runtime starts
// 4. Registers adapters and runs the scheduler until SIGTERM/SIGINT
//
// ## Configuration
//
// ### Target
// - `--zone-id` / `ZONESYNC_ZONE_ID`: Cloudflare zone identifier
// - `--record` / `ZONESYNC_RECORD`: Record name to keep current (exact match)
// - `--interval` / `ZONESYNC_INTERVAL`: Seconds between cycles
// - `--cycle-timeout` / `ZONESYNC_CYCLE_TIMEOUT`: Per-cycle budget (defaults to the interval)
//
// ### Public IP
// - `--ip-url` / `ZONESYNC_IP_URL`: "What is my IP" endpoint
// - `--ip-version` / `ZONESYNC_IP_VERSION`: v4, v6 or both
//
// ### Credentials (environment only)
// - `CLOUDFLARE_API_TOKEN`, or
// - `CLOUDFLARE_API_KEY` together with `CLOUDFLARE_API_EMAIL`
//
// ### Misc
// - `--dry-run` / `ZONESYNC_DRY_RUN`: Log updates instead of sending them
// - `--log-level` / `ZONESYNC_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// export CLOUDFLARE_API_TOKEN=...
// zonesyncd --zone-id 023e105f4ecef8ad9ca31a8372d0c353 \
//           --record home.example.com --interval 300
// ```

use anyhow::Result;
use clap::Parser;
use clap::error::ErrorKind;
use std::future::Future;
use std::process::ExitCode;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;
use zonesync_core::config::{CloudflareCredentials, DEFAULT_RESOLVER_URL, IpVersion};
use zonesync_core::{
    AdapterRegistry, DaemonConfig, ProviderConfig, ReconcileConfig, Reconciler, ResolverConfig,
    Scheduler, SchedulerConfig,
};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum ZonesyncExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<ZonesyncExitCode> for ExitCode {
    fn from(code: ZonesyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Keep one DNS record pointed at this host's public IP address
#[derive(Debug, Parser)]
#[command(name = "zonesyncd")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// Cloudflare zone identifier
    #[arg(long, env = "ZONESYNC_ZONE_ID")]
    zone_id: String,

    /// Record name to reconcile (e.g. home.example.com)
    #[arg(long, env = "ZONESYNC_RECORD")]
    record: String,

    /// Seconds between reconciliation cycles
    #[arg(long, env = "ZONESYNC_INTERVAL", value_name = "SECONDS")]
    interval: u64,

    /// Per-cycle time budget in seconds (defaults to the interval)
    #[arg(long, env = "ZONESYNC_CYCLE_TIMEOUT", value_name = "SECONDS")]
    cycle_timeout: Option<u64>,

    /// URL returning the public IP as plain text
    #[arg(long, env = "ZONESYNC_IP_URL", default_value = DEFAULT_RESOLVER_URL)]
    ip_url: String,

    /// Accepted address family (v4, v6, both)
    #[arg(long, env = "ZONESYNC_IP_VERSION")]
    ip_version: Option<IpVersion>,

    /// Log intended updates without sending them
    #[arg(long, env = "ZONESYNC_DRY_RUN")]
    dry_run: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "ZONESYNC_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Args {
    /// Assemble the daemon configuration
    fn into_config(self, credentials: CloudflareCredentials) -> DaemonConfig {
        DaemonConfig {
            reconcile: ReconcileConfig {
                zone_id: self.zone_id,
                record_name: self.record,
                poll_interval_secs: self.interval,
                cycle_timeout_secs: self.cycle_timeout,
            },
            resolver: ResolverConfig::Http {
                url: self.ip_url,
                version: self.ip_version,
            },
            provider: ProviderConfig::Cloudflare {
                credentials,
                base_url: None,
                dry_run: self.dry_run,
            },
            scheduler: SchedulerConfig::default(),
        }
    }

    /// Validate what the core configuration types cannot know about
    fn validate(&self) -> Result<()> {
        if self.zone_id.trim().is_empty() {
            anyhow::bail!("ZONESYNC_ZONE_ID is required");
        }

        if self.interval == 0 {
            anyhow::bail!("ZONESYNC_INTERVAL must be greater than zero");
        }

        validate_domain_name(&self.record)?;
        parse_log_level(&self.log_level)?;

        // Warn if using HTTP (not HTTPS)
        if self.ip_url.starts_with("http://") {
            eprintln!(
                "WARNING: ZONESYNC_IP_URL uses HTTP (not HTTPS). \
                 The response could be tampered with in transit."
            );
        }

        Ok(())
    }
}

/// Read Cloudflare credentials through `lookup`
///
/// A scoped token wins over a global key when both are present.
fn credentials_from<F>(lookup: F) -> Result<CloudflareCredentials>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(token) = non_empty("CLOUDFLARE_API_TOKEN") {
        check_secret("CLOUDFLARE_API_TOKEN", &token)?;
        return Ok(CloudflareCredentials::ApiToken { token });
    }

    match (non_empty("CLOUDFLARE_API_KEY"), non_empty("CLOUDFLARE_API_EMAIL")) {
        (Some(key), Some(email)) => {
            check_secret("CLOUDFLARE_API_KEY", &key)?;
            Ok(CloudflareCredentials::GlobalKey { key, email })
        }
        (Some(_), None) => anyhow::bail!(
            "CLOUDFLARE_API_EMAIL is required when CLOUDFLARE_API_KEY is set"
        ),
        _ => anyhow::bail!(
            "Cloudflare credentials are required. \
             Set CLOUDFLARE_API_TOKEN, or CLOUDFLARE_API_KEY and CLOUDFLARE_API_EMAIL"
        ),
    }
}

/// Reject secrets that are clearly not real
fn check_secret(name: &str, value: &str) -> Result<()> {
    // Cloudflare tokens are 40 characters, global keys 37
    if value.len() < 20 {
        anyhow::bail!(
            "{} appears too short ({} chars). Verify the value is correct.",
            name,
            value.len()
        );
    }

    let lower = value.to_lowercase();
    if lower.contains("your_token")
        || lower.contains("replace_me")
        || lower.contains("example")
        || lower.contains("changeme")
    {
        anyhow::bail!(
            "{} appears to be a placeholder. Use a real credential from the Cloudflare dashboard.",
            name
        );
    }

    Ok(())
}

fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "ZONESYNC_LOG_LEVEL '{}' is not valid. \
             Valid levels: trace, debug, info, warn, error",
            level
        ),
    }
}

/// Validate that a string is a plausible DNS record name
///
/// Basic RFC 1035 checks, relaxed for underscores (`_acme-challenge`) and a
/// leading wildcard label. Names are matched exactly against the zone, so
/// a trailing dot is rejected rather than stripped.
fn validate_domain_name(domain: &str) -> Result<()> {
    if domain.is_empty() {
        anyhow::bail!("ZONESYNC_RECORD is required");
    }

    if domain.len() > 253 {
        anyhow::bail!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        );
    }

    if !domain.contains('.') {
        anyhow::bail!("Domain name must be fully qualified. Got: '{}'", domain);
    }

    for (index, label) in domain.split('.').enumerate() {
        if label.is_empty() {
            anyhow::bail!(
                "Domain name has empty label: '{}' (omit any trailing dot)",
                domain
            );
        }

        if label == "*" && index == 0 {
            continue;
        }

        if label.len() > 63 {
            anyhow::bail!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            );
        }

        if !label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            anyhow::bail!(
                "Domain label contains invalid characters. Label: '{}'. \
                 Valid: alphanumeric, hyphen and underscore.",
                label
            );
        }

        if label.starts_with('-') || label.ends_with('-') {
            anyhow::bail!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            );
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    ZonesyncExitCode::CleanShutdown.into()
                }
                _ => ZonesyncExitCode::ConfigError.into(),
            };
        }
    };

    if let Err(e) = args.validate() {
        eprintln!("Configuration validation error: {}", e);
        return ZonesyncExitCode::ConfigError.into();
    }

    let credentials = match credentials_from(|name| std::env::var(name).ok()) {
        Ok(credentials) => credentials,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ZonesyncExitCode::ConfigError.into();
        }
    };

    let log_level = parse_log_level(&args.log_level).unwrap_or(Level::INFO);
    let config = args.into_config(credentials);

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return ZonesyncExitCode::ConfigError.into();
    }

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ZonesyncExitCode::ConfigError.into();
    }

    info!("Starting zonesyncd {}", env!("CARGO_PKG_VERSION"));
    info!(
        zone_id = %config.reconcile.zone_id,
        record = %config.reconcile.record_name,
        interval_secs = config.reconcile.poll_interval_secs,
        resolver = config.resolver.type_name(),
        provider = config.provider.type_name(),
        "Configuration loaded"
    );

    // One cycle at a time, so one thread is enough
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return ZonesyncExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        let scheduler = match build_scheduler(config) {
            Ok(scheduler) => scheduler,
            Err(e) => {
                error!("Startup error: {}", e);
                return ZonesyncExitCode::ConfigError;
            }
        };

        match run_daemon(scheduler).await {
            Ok(()) => ZonesyncExitCode::CleanShutdown,
            Err(e) => {
                error!("Daemon error: {}", e);
                ZonesyncExitCode::RuntimeError
            }
        }
    });

    result.into()
}

/// Register adapters and wire them into a scheduler
fn build_scheduler(config: DaemonConfig) -> zonesync_core::Result<Scheduler> {
    let registry = AdapterRegistry::new();

    #[cfg(feature = "cloudflare")]
    zonesync_provider_cloudflare::register(&registry);

    #[cfg(feature = "http")]
    zonesync_ip_http::register(&registry);

    let resolver = registry.create_resolver(&config.resolver)?;
    let zone = registry.create_zone_source(&config.provider)?;
    let reconciler = Reconciler::new(resolver, zone);

    // Nobody consumes scheduler events here; logs are the only surface
    let (scheduler, _events) = Scheduler::new(reconciler, config.reconcile, config.scheduler)?;
    Ok(scheduler)
}

/// Run the scheduler until a shutdown signal arrives
async fn run_daemon(scheduler: Scheduler) -> Result<()> {
    let shutdown = shutdown_signal()?;
    scheduler.run_until(shutdown).await?;
    info!("Shutting down daemon");
    Ok(())
}

/// Resolve on SIGTERM or SIGINT
///
/// Handlers are installed before returning, so a signal that arrives while
/// a cycle is running is not lost.
#[cfg(unix)]
fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(async move {
        let name = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        };
        info!("Received shutdown signal: {}", name);
    })
}

/// Resolve on Ctrl-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    Ok(async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received shutdown signal: CTRL-C"),
            Err(e) => {
                tracing::warn!("Failed to wait for CTRL-C: {}", e);
                std::future::pending::<()>().await;
            }
        }
    })
}
