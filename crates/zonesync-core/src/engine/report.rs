//! Cycle reports
//!
//! A [`CycleReport`] describes what one cycle saw and did. It exists for
//! logging and observers only; nothing feeds it back into the next cycle.

use chrono::{DateTime, Utc};
use std::net::IpAddr;

/// Why a cycle stopped before comparing records
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The public IP could not be resolved
    ResolutionFailed(String),
    /// The zone's records could not be listed
    ListFailed(String),
}

/// Outcome for one matching record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordStatus {
    /// Content already equals the public IP
    Unchanged,
    /// Content was replaced
    Updated {
        /// Content before the update
        previous: String,
        /// Content reported by the provider after the update
        current: String,
    },
    /// The update call failed
    UpdateFailed {
        /// Error description
        error: String,
    },
    /// Content is not an IP address; left untouched
    InvalidRemoteIp {
        /// The offending content
        content: String,
    },
}

/// Result of reconciling one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordOutcome {
    /// Provider record identifier
    pub record_id: String,
    /// Record name
    pub record_name: String,
    /// What happened
    pub status: RecordStatus,
}

/// Summary of one reconciliation cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Cycle number
    pub cycle: u64,
    /// Wall-clock start time
    pub started_at: DateTime<Utc>,
    /// The resolved public IP, if resolution succeeded
    pub public_ip: Option<IpAddr>,
    /// Set when the cycle stopped before comparing records
    pub skipped: Option<SkipReason>,
    /// One entry per matching record, in provider order
    pub outcomes: Vec<RecordOutcome>,
}

/// Per-status counts for a report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    /// Records whose name matched
    pub matched: usize,
    /// Records already holding the public IP
    pub unchanged: usize,
    /// Records successfully updated
    pub updated: usize,
    /// Records whose update call failed
    pub update_failed: usize,
    /// Records whose content was not an IP address
    pub invalid: usize,
}

impl CycleReport {
    pub(crate) fn new(cycle: u64) -> Self {
        Self {
            cycle,
            started_at: Utc::now(),
            public_ip: None,
            skipped: None,
            outcomes: Vec::new(),
        }
    }

    pub(crate) fn skip(mut self, reason: SkipReason) -> Self {
        self.skipped = Some(reason);
        self
    }

    /// Whether the cycle stopped before comparing records
    pub fn is_skipped(&self) -> bool {
        self.skipped.is_some()
    }

    /// Whether any step of the cycle failed
    pub fn has_failures(&self) -> bool {
        self.is_skipped()
            || self.outcomes.iter().any(|o| {
                matches!(
                    o.status,
                    RecordStatus::UpdateFailed { .. } | RecordStatus::InvalidRemoteIp { .. }
                )
            })
    }

    /// Count outcomes by status
    pub fn summary(&self) -> CycleSummary {
        let mut summary = CycleSummary {
            matched: self.outcomes.len(),
            ..CycleSummary::default()
        };
        for outcome in &self.outcomes {
            match outcome.status {
                RecordStatus::Unchanged => summary.unchanged += 1,
                RecordStatus::Updated { .. } => summary.updated += 1,
                RecordStatus::UpdateFailed { .. } => summary.update_failed += 1,
                RecordStatus::InvalidRemoteIp { .. } => summary.invalid += 1,
            }
        }
        summary
    }
}
