// # Zone Record Source Trait
//
// Defines the interface to a DNS provider's zone: list the records in a
// zone and update one record's content by identifier.
//
// ## Implementations
//
// - Cloudflare API v4: `zonesync-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use zonesync_core::ZoneRecordSource;
//
// let records = source.list_records("zone-id", &ctx).await?;
// for record in records.iter().filter(|r| r.name == "home.example.com") {
//     source.update_record("zone-id", &record.id, "203.0.113.9", &ctx).await?;
// }
// ```

use crate::context::CycleContext;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A DNS record as returned by the provider
///
/// The reconciler holds these only for the duration of one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Provider record identifier (stable across updates)
    pub id: String,
    /// Fully qualified record name
    pub name: String,
    /// Record content; an IP address string for A/AAAA records
    pub content: String,
    /// Record type (e.g. "A", "AAAA")
    pub record_type: String,
    /// Time-to-live, if reported
    pub ttl: Option<u32>,
    /// Provider-specific metadata, never inspected by the reconciler
    #[serde(default)]
    pub extra: serde_json::Value,
}

impl DnsRecord {
    /// Create a record with no TTL or extra metadata
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        record_type: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            content: content.into(),
            record_type: record_type.into(),
            ttl: None,
            extra: serde_json::Value::Null,
        }
    }
}

/// Trait for zone record sources
///
/// # Trust Level: Untrusted
///
/// Sources are thin API wrappers:
///
/// - ✅ Perform HTTP/HTTPS calls to their provider's endpoints only
/// - ✅ Parse provider-specific responses into [`DnsRecord`]
/// - ❌ Retry or back off (the fixed poll interval is the retry policy)
/// - ❌ Decide whether an update is needed (owned by the reconciler)
/// - ❌ Cache records between calls
/// - ❌ Spawn tasks
///
/// Every failure, including authentication problems and an expired
/// deadline, is reported as [`crate::Error::Provider`].
#[async_trait]
pub trait ZoneRecordSource: Send + Sync {
    /// List every record in a zone
    ///
    /// The returned records are a consistent snapshot as of this call.
    ///
    /// # Parameters
    ///
    /// - `zone_id`: Provider zone identifier
    /// - `ctx`: The current cycle context
    async fn list_records(
        &self,
        zone_id: &str,
        ctx: &CycleContext,
    ) -> Result<Vec<DnsRecord>, crate::Error>;

    /// Replace the content of one record
    ///
    /// Only the content field changes; name, type, TTL and metadata stay as
    /// they are. Calling this twice with the same content is harmless.
    ///
    /// # Parameters
    ///
    /// - `zone_id`: Provider zone identifier
    /// - `record_id`: Provider record identifier
    /// - `content`: The new content
    /// - `ctx`: The current cycle context
    ///
    /// # Returns
    ///
    /// The record as stored by the provider after the update
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        content: &str,
        ctx: &CycleContext,
    ) -> Result<DnsRecord, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing zone record sources from configuration
pub trait ZoneRecordSourceFactory: Send + Sync {
    /// Create a ZoneRecordSource instance from configuration
    fn create(
        &self,
        config: &crate::config::ProviderConfig,
    ) -> Result<Box<dyn ZoneRecordSource>, crate::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_has_no_metadata() {
        let record = DnsRecord::new("r1", "home.example.com", "A", "203.0.113.5");
        assert_eq!(record.id, "r1");
        assert_eq!(record.content, "203.0.113.5");
        assert_eq!(record.ttl, None);
        assert!(record.extra.is_null());
    }
}
