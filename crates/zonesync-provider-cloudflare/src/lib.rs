// # Cloudflare Zone Record Source
//
// This crate provides the Cloudflare API v4 implementation of
// `ZoneRecordSource` for zonesync.
//
// ## Behaviour
//
// - One HTTP request per page when listing, one per update
// - Every request is bounded by the remaining cycle budget
// - Errors are mapped per status code and propagated; the scheduler owns
//   retrying (by running the next cycle)
// - Dry-run mode performs all GETs and logs the intended PATCH
//
// ## Security
//
// - Credentials never appear in logs or Debug output
// - Credentials come from the environment, never from flags
//
// ## API Reference
//
// - List DNS Records: GET `/zones/:zone_id/dns_records?page=N&per_page=100`
// - DNS Record Details: GET `/zones/:zone_id/dns_records/:record_id`
// - Patch DNS Record: PATCH `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use zonesync_core::config::{CloudflareCredentials, ProviderConfig};
use zonesync_core::traits::{ZoneRecordSource, ZoneRecordSourceFactory};
use zonesync_core::{AdapterRegistry, CycleContext, DnsRecord, Error, Result};

/// Cloudflare API base URL
const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Records requested per page (the API maximum for this endpoint)
const PER_PAGE: u32 = 100;

/// Connection establishment timeout (requests are bounded by the cycle)
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const PROVIDER: &str = "cloudflare";

/// Cloudflare zone record source
///
/// Stateless between calls: every list and update goes to the API.
///
/// # Dry-Run Mode
///
/// When `dry_run` is true the source will:
/// - Perform all GET requests
/// - Log the intended PATCH payload
/// - **NOT** modify any record
pub struct CloudflareZoneSource {
    /// API credentials
    /// ⚠️ NEVER log these
    credentials: CloudflareCredentials,

    /// API base URL, without trailing slash
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// If true, GETs run but updates are only logged
    dry_run: bool,
}

// Custom Debug implementation that hides the credentials
impl std::fmt::Debug for CloudflareZoneSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareZoneSource")
            .field("credentials", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl CloudflareZoneSource {
    /// Create a new Cloudflare zone source
    ///
    /// # Parameters
    ///
    /// - `credentials`: API token, or global key with account email
    /// - `base_url`: API base override (tests, proxies); defaults to the
    ///   public v4 endpoint
    /// - `dry_run`: If true, perform GET requests but skip PATCH updates
    pub fn new(
        credentials: CloudflareCredentials,
        base_url: Option<String>,
        dry_run: bool,
    ) -> Result<Self> {
        credentials.validate()?;

        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(concat!("zonesync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = base_url
            .unwrap_or_else(|| CLOUDFLARE_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            credentials,
            base_url,
            client,
            dry_run,
        })
    }

    /// Whether updates are only logged
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn records_url(&self, zone_id: &str) -> String {
        format!("{}/zones/{}/dns_records", self.base_url, zone_id)
    }

    fn record_url(&self, zone_id: &str, record_id: &str) -> String {
        format!("{}/zones/{}/dns_records/{}", self.base_url, zone_id, record_id)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            CloudflareCredentials::ApiToken { token } => request.bearer_auth(token),
            CloudflareCredentials::GlobalKey { key, email } => request
                .header("X-Auth-Key", key)
                .header("X-Auth-Email", email),
        }
    }

    /// Send one request and unwrap the v4 response envelope
    ///
    /// The request timeout is whatever is left of the cycle budget.
    async fn call<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        action: &str,
        ctx: &CycleContext,
    ) -> Result<Envelope<T>> {
        let budget = ctx.remaining();
        if budget.is_zero() {
            return Err(Error::provider(
                PROVIDER,
                format!("{}: cycle deadline exceeded before request", action),
            ));
        }

        let response = self
            .authorize(request)
            .header("Content-Type", "application/json")
            .timeout(budget)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::provider(PROVIDER, format!("{}: request timed out", action))
                } else {
                    Error::provider(PROVIDER, format!("{}: HTTP request failed: {}", action, e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(status_error(status, &body, action));
        }

        let envelope: Envelope<T> = response.json().await.map_err(|e| {
            Error::provider(PROVIDER, format!("{}: failed to parse response: {}", action, e))
        })?;

        if !envelope.success {
            return Err(Error::provider(
                PROVIDER,
                format!("{} rejected: {}", action, join_messages(&envelope.errors)),
            ));
        }

        Ok(envelope)
    }

    async fn get_record(
        &self,
        zone_id: &str,
        record_id: &str,
        ctx: &CycleContext,
    ) -> Result<DnsRecord> {
        let request = self.client.get(self.record_url(zone_id, record_id));
        let envelope: Envelope<CloudflareRecord> =
            self.call(request, "Record lookup", ctx).await?;

        envelope
            .result
            .map(DnsRecord::from)
            .ok_or_else(|| Error::provider(PROVIDER, "Record lookup returned no result"))
    }
}

#[async_trait]
impl ZoneRecordSource for CloudflareZoneSource {
    /// List every DNS record in the zone, following pagination
    ///
    /// ```http
    /// GET /zones/:zone_id/dns_records?page=1&per_page=100
    /// ```
    async fn list_records(&self, zone_id: &str, ctx: &CycleContext) -> Result<Vec<DnsRecord>> {
        let mut records = Vec::new();
        let mut page: u32 = 1;

        loop {
            if ctx.is_expired() {
                return Err(Error::provider(
                    PROVIDER,
                    format!("Record listing: cycle deadline exceeded at page {}", page),
                ));
            }

            let request = self
                .client
                .get(self.records_url(zone_id))
                .query(&[("page", page), ("per_page", PER_PAGE)]);
            let envelope: Envelope<Vec<CloudflareRecord>> =
                self.call(request, "Record listing", ctx).await?;

            let batch = envelope.result.unwrap_or_default();
            tracing::debug!(zone_id, page, count = batch.len(), "Fetched record page");
            records.extend(batch.into_iter().map(DnsRecord::from));

            let total_pages = envelope.result_info.map_or(1, |info| info.total_pages);
            if page >= total_pages {
                break;
            }
            page += 1;
        }

        Ok(records)
    }

    /// Replace the content of one record
    ///
    /// ```http
    /// PATCH /zones/:zone_id/dns_records/:record_id
    /// { "content": "203.0.113.9" }
    /// ```
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        content: &str,
        ctx: &CycleContext,
    ) -> Result<DnsRecord> {
        let url = self.record_url(zone_id, record_id);
        let payload = serde_json::json!({ "content": content });

        if self.dry_run {
            let mut record = self.get_record(zone_id, record_id, ctx).await?;
            tracing::info!(
                record_id,
                record = %record.name,
                "[DRY-RUN] Would send PATCH to {} with payload: {}",
                url,
                payload
            );
            record.content = content.to_string();
            return Ok(record);
        }

        let request = self.client.patch(&url).json(&payload);
        let envelope: Envelope<CloudflareRecord> =
            self.call(request, "Record update", ctx).await?;

        let record = envelope
            .result
            .map(DnsRecord::from)
            .ok_or_else(|| Error::provider(PROVIDER, "Record update returned no result"))?;

        tracing::debug!(record_id, content = %record.content, "Record patched");
        Ok(record)
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

/// Cloudflare v4 response envelope
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
    #[serde(default)]
    result_info: Option<ResultInfo>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct ResultInfo {
    #[serde(default = "first_page")]
    total_pages: u32,
}

fn first_page() -> u32 {
    1
}

/// DNS record as the API returns it
#[derive(Debug, Deserialize)]
struct CloudflareRecord {
    id: String,
    name: String,
    #[serde(rename = "type")]
    record_type: String,
    content: String,
    #[serde(default)]
    ttl: Option<u32>,
    /// proxied, comment, tags, timestamps...
    #[serde(flatten)]
    rest: serde_json::Map<String, serde_json::Value>,
}

impl From<CloudflareRecord> for DnsRecord {
    fn from(record: CloudflareRecord) -> Self {
        DnsRecord {
            id: record.id,
            name: record.name,
            content: record.content,
            record_type: record.record_type,
            ttl: record.ttl,
            extra: serde_json::Value::Object(record.rest),
        }
    }
}

fn join_messages(messages: &[ApiMessage]) -> String {
    if messages.is_empty() {
        return "no error details".to_string();
    }
    messages
        .iter()
        .map(|m| format!("[{}] {}", m.code, m.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Map a non-success HTTP status to a provider error
fn status_error(status: StatusCode, body: &str, action: &str) -> Error {
    // Error bodies are usually envelopes too
    let detail = serde_json::from_str::<Envelope<serde_json::Value>>(body)
        .map(|envelope| join_messages(&envelope.errors))
        .unwrap_or_else(|_| body.trim().to_string());

    let message = match status.as_u16() {
        401 | 403 => format!(
            "Authentication failed: invalid credentials or insufficient permissions. Status: {}",
            status
        ),
        404 => format!("{}: zone or record not found. Status: {}", action, status),
        409 => format!(
            "Conflict: record is being modified by another request. Status: {}",
            status
        ),
        429 => format!("Rate limit exceeded. Status: {}", status),
        500..=599 => format!(
            "Cloudflare server error (transient): {} - {}",
            status, detail
        ),
        _ => format!("{} failed: {} - {}", action, status, detail),
    };

    Error::provider(PROVIDER, message)
}

/// Factory for creating Cloudflare zone sources
pub struct CloudflareFactory;

impl ZoneRecordSourceFactory for CloudflareFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn ZoneRecordSource>> {
        match config {
            ProviderConfig::Cloudflare {
                credentials,
                base_url,
                dry_run,
            } => {
                if *dry_run {
                    tracing::warn!(
                        "Cloudflare source running in DRY-RUN mode - no records will be changed"
                    );
                }

                Ok(Box::new(CloudflareZoneSource::new(
                    credentials.clone(),
                    base_url.clone(),
                    *dry_run,
                )?))
            }
            _ => Err(Error::config("Invalid config for Cloudflare zone source")),
        }
    }
}

/// Register the Cloudflare zone source with a registry
pub fn register(registry: &AdapterRegistry) {
    registry.register_zone_source(PROVIDER, Box::new(CloudflareFactory));
}
