//! One reconciliation cycle
//!
//! ## Flow
//!
//! 1. Resolve the public IP (failure ends the cycle)
//! 2. List the zone's records (failure ends the cycle)
//! 3. Keep records whose name equals the configured name
//! 4. Per record: validate, compare, update on mismatch
//!
//! Every adapter call is raced against the cycle deadline, so a stuck
//! adapter surfaces as an ordinary error instead of stalling the loop.

use crate::config::ReconcileConfig;
use crate::context::CycleContext;
use crate::engine::report::{CycleReport, RecordOutcome, RecordStatus, SkipReason};
use crate::error::{Error, Result};
use crate::traits::{DnsRecord, IpResolver, ZoneRecordSource};
use std::net::IpAddr;
use tracing::{debug, error, info, warn};

/// Executes single reconciliation cycles
///
/// The reconciler owns its adapters but keeps no state between cycles:
/// every call to [`Reconciler::run_cycle`] starts from scratch.
pub struct Reconciler {
    /// Public IP lookup
    resolver: Box<dyn IpResolver>,

    /// Provider zone access
    zone: Box<dyn ZoneRecordSource>,
}

impl Reconciler {
    /// Create a reconciler from its two adapters
    pub fn new(resolver: Box<dyn IpResolver>, zone: Box<dyn ZoneRecordSource>) -> Self {
        Self { resolver, zone }
    }

    /// Run one cycle
    ///
    /// Never fails: every adapter error is logged and recorded in the
    /// returned report.
    ///
    /// # Parameters
    ///
    /// - `config`: The reconciliation target
    /// - `ctx`: Context bounding this cycle
    pub async fn run_cycle(&self, config: &ReconcileConfig, ctx: &CycleContext) -> CycleReport {
        let mut report = CycleReport::new(ctx.cycle());

        let public_ip = match self.resolve(ctx).await {
            Ok(ip) => ip,
            Err(e) => {
                error!(cycle = ctx.cycle(), error = %e, "Error fetching public IP, skipping cycle");
                return report.skip(SkipReason::ResolutionFailed(e.to_string()));
            }
        };
        info!(cycle = ctx.cycle(), public_ip = %public_ip, "Public IP resolved");
        report.public_ip = Some(public_ip);

        let records = match self.list(config, ctx).await {
            Ok(records) => records,
            Err(e) => {
                error!(
                    cycle = ctx.cycle(),
                    zone_id = %config.zone_id,
                    error = %e,
                    "Error fetching DNS records, skipping cycle"
                );
                return report.skip(SkipReason::ListFailed(e.to_string()));
            }
        };
        debug!(cycle = ctx.cycle(), count = records.len(), "Fetched zone records");

        let expected = public_ip.to_string();
        for record in records.iter().filter(|r| r.name == config.record_name) {
            let status = self.reconcile_record(config, record, &expected, ctx).await;
            report.outcomes.push(RecordOutcome {
                record_id: record.id.clone(),
                record_name: record.name.clone(),
                status,
            });
        }

        if report.outcomes.is_empty() {
            info!(
                cycle = ctx.cycle(),
                record = %config.record_name,
                "No records match the configured name, nothing to reconcile"
            );
        }

        report
    }

    /// Reconcile one matching record against the expected content
    async fn reconcile_record(
        &self,
        config: &ReconcileConfig,
        record: &DnsRecord,
        expected: &str,
        ctx: &CycleContext,
    ) -> RecordStatus {
        if let Err(e) = validate_content(record) {
            error!(record_id = %record.id, content = %record.content, error = %e, "Invalid IP in DNS record");
            return RecordStatus::InvalidRemoteIp {
                content: record.content.clone(),
            };
        }

        // Plain string equality: "2001:db8::1" and its expanded form differ
        if record.content == expected {
            info!(
                record_id = %record.id,
                remote_ip = %record.content,
                expected_ip = %expected,
                "DNS record matches public IP"
            );
            return RecordStatus::Unchanged;
        }

        warn!(
            record_id = %record.id,
            remote_ip = %record.content,
            expected_ip = %expected,
            "DNS record does not match public IP, updating"
        );

        match self.update(config, record, expected, ctx).await {
            Ok(updated) => {
                info!(
                    record_id = %updated.id,
                    name = %updated.name,
                    content = %updated.content,
                    record_type = %updated.record_type,
                    "Record updated successfully"
                );
                RecordStatus::Updated {
                    previous: record.content.clone(),
                    current: updated.content,
                }
            }
            Err(e) => {
                error!(record_id = %record.id, error = %e, "Error updating DNS record");
                RecordStatus::UpdateFailed {
                    error: e.to_string(),
                }
            }
        }
    }

    async fn resolve(&self, ctx: &CycleContext) -> Result<IpAddr> {
        ctx.bound(self.resolver.resolve(ctx))
            .await
            .map_err(|e| Error::resolution(format!("{} ({})", e, self.resolver.resolver_name())))?
    }

    async fn list(&self, config: &ReconcileConfig, ctx: &CycleContext) -> Result<Vec<DnsRecord>> {
        ctx.bound(self.zone.list_records(&config.zone_id, ctx))
            .await
            .map_err(|e| Error::provider(self.zone.provider_name(), e.to_string()))?
    }

    async fn update(
        &self,
        config: &ReconcileConfig,
        record: &DnsRecord,
        content: &str,
        ctx: &CycleContext,
    ) -> Result<DnsRecord> {
        ctx.bound(
            self.zone
                .update_record(&config.zone_id, &record.id, content, ctx),
        )
        .await
        .map_err(|e| Error::provider(self.zone.provider_name(), e.to_string()))?
    }
}

/// Check that a record's content is a syntactically valid IP address
pub fn validate_content(record: &DnsRecord) -> Result<IpAddr> {
    record
        .content
        .parse()
        .map_err(|_| Error::invalid_remote_record(&record.id, &record.content))
}
