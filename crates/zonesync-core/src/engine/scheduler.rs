//! Fixed-cadence scheduler loop
//!
//! ```text
//!            start
//!              │
//!              ▼
//!   ┌──────► Running ──── run_cycle() returns ────┐
//!   │                                             ▼
//!   └──── poll interval elapsed ──────────────── Idle
//! ```
//!
//! The loop sleeps the full poll interval after every cycle, however long
//! the cycle took. There is no backoff: a dependency that keeps failing is
//! retried at the same cadence forever. Shutdown is only observed while
//! `Idle`, so a cycle that has started always settles first.

use crate::config::{ReconcileConfig, SchedulerConfig};
use crate::context::CycleContext;
use crate::engine::reconciler::Reconciler;
use crate::engine::report::CycleReport;
use crate::error::Result;
use std::future::Future;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

/// Scheduler state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Between cycles
    Idle,
    /// Executing a cycle
    Running {
        /// The cycle being executed
        cycle: u64,
    },
}

/// Events emitted by the scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerEvent {
    /// Loop started
    Started {
        /// Record being reconciled
        record_name: String,
        /// Seconds between cycles
        poll_interval_secs: u64,
    },

    /// A cycle finished
    CycleCompleted(CycleReport),

    /// Loop stopped
    Stopped {
        /// Why
        reason: String,
        /// Cycles executed
        cycles: u64,
    },
}

/// Drives the [`Reconciler`] at a fixed interval
///
/// ## Lifecycle
///
/// 1. Create with [`Scheduler::new()`] (validates configuration)
/// 2. Start with [`Scheduler::run()`] or [`Scheduler::run_until()`]
/// 3. The loop runs until the shutdown future resolves
pub struct Scheduler {
    /// Executes each cycle
    reconciler: Reconciler,

    /// Immutable target configuration
    config: ReconcileConfig,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<SchedulerEvent>,

    /// Current state, for observers
    state_tx: watch::Sender<SchedulerState>,
}

impl Scheduler {
    /// Create a new scheduler
    ///
    /// # Returns
    ///
    /// A tuple of (scheduler, event_receiver). Fails with
    /// [`crate::Error::Config`] if either configuration is invalid.
    pub fn new(
        reconciler: Reconciler,
        config: ReconcileConfig,
        scheduler_config: SchedulerConfig,
    ) -> Result<(Self, mpsc::Receiver<SchedulerEvent>)> {
        config.validate()?;
        scheduler_config.validate()?;

        let (event_tx, event_rx) = mpsc::channel(scheduler_config.event_channel_capacity);
        let (state_tx, _) = watch::channel(SchedulerState::Idle);

        let scheduler = Self {
            reconciler,
            config,
            event_tx,
            state_tx,
        };

        Ok((scheduler, event_rx))
    }

    /// The configuration this scheduler reconciles
    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Subscribe to state transitions
    pub fn subscribe_state(&self) -> watch::Receiver<SchedulerState> {
        self.state_tx.subscribe()
    }

    /// Current state
    pub fn state(&self) -> SchedulerState {
        *self.state_tx.borrow()
    }

    /// Run until Ctrl-C
    pub async fn run(&self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Run until `shutdown` resolves
    ///
    /// The first cycle starts immediately.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        info!(
            zone_id = %self.config.zone_id,
            record = %self.config.record_name,
            interval_secs = self.config.poll_interval_secs,
            "Scheduler started"
        );
        self.emit_event(SchedulerEvent::Started {
            record_name: self.config.record_name.clone(),
            poll_interval_secs: self.config.poll_interval_secs,
        });

        let mut cycle = 0u64;
        loop {
            cycle += 1;
            let report = self.run_cycle(cycle).await;
            self.emit_event(SchedulerEvent::CycleCompleted(report));

            debug!(cycle, sleep = ?self.config.poll_interval(), "Waiting for next cycle");
            tokio::select! {
                _ = tokio::time::sleep(self.config.poll_interval()) => {}
                _ = &mut shutdown => {
                    info!(cycles = cycle, "Shutdown signal received, scheduler stopped");
                    self.emit_event(SchedulerEvent::Stopped {
                        reason: "Shutdown signal".to_string(),
                        cycles: cycle,
                    });
                    break;
                }
            }
        }

        Ok(())
    }

    /// Execute exactly one cycle, moving Idle → Running → Idle
    pub async fn run_cycle(&self, cycle: u64) -> CycleReport {
        self.state_tx.send_replace(SchedulerState::Running { cycle });

        let ctx = CycleContext::new(cycle, self.config.cycle_budget());
        let report = self.reconciler.run_cycle(&self.config, &ctx).await;

        let summary = report.summary();
        if report.has_failures() {
            warn!(
                cycle,
                matched = summary.matched,
                unchanged = summary.unchanged,
                updated = summary.updated,
                update_failed = summary.update_failed,
                invalid = summary.invalid,
                skipped = report.is_skipped(),
                elapsed = ?ctx.elapsed(),
                "Cycle completed with failures"
            );
        } else {
            info!(
                cycle,
                matched = summary.matched,
                unchanged = summary.unchanged,
                updated = summary.updated,
                elapsed = ?ctx.elapsed(),
                "Cycle completed"
            );
        }

        self.state_tx.send_replace(SchedulerState::Idle);
        report
    }

    /// Emit a scheduler event without blocking
    fn emit_event(&self, event: SchedulerEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            // Nobody is listening
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
}
