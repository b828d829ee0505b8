//! Reconciliation engine
//!
//! The engine is split in two:
//!
//! - [`Reconciler`]: what runs once. Resolves the public IP, lists the
//!   zone, compares and corrects matching records.
//! - [`Scheduler`]: how often it runs. A two-state loop that starts a
//!   cycle immediately and then after every poll interval.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   every interval   ┌──────────────┐
//! │  Scheduler  │ ─────────────────► │  Reconciler  │
//! └─────────────┘   CycleContext     └──────────────┘
//!        ▲                                  │
//!        │ CycleReport          ┌───────────┴───────────┐
//!        │                      ▼                       ▼
//!        │              ┌──────────────┐      ┌──────────────────┐
//!        └───────────── │  IpResolver  │      │ ZoneRecordSource │
//!                       │  (resolve)   │      │ (list / update)  │
//!                       └──────────────┘      └──────────────────┘
//! ```

pub mod reconciler;
pub mod report;
pub mod scheduler;

pub use reconciler::Reconciler;
pub use report::{CycleReport, CycleSummary, RecordOutcome, RecordStatus, SkipReason};
pub use scheduler::{Scheduler, SchedulerEvent, SchedulerState};
