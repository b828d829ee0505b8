//! Per-cycle execution context
//!
//! A [`CycleContext`] is created fresh by the scheduler for every cycle and
//! threaded by reference through every adapter call made during that cycle.
//! It carries an absolute deadline; nothing in the cycle may outlive it.

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Deadline used when `now + budget` cannot be represented (about 30 years)
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Returned by [`CycleContext::bound`] when the deadline passes first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineExceeded;

impl std::fmt::Display for DeadlineExceeded {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("cycle deadline exceeded")
    }
}

impl std::error::Error for DeadlineExceeded {}

/// Bounded execution context for one reconciliation cycle
#[derive(Debug, Clone)]
pub struct CycleContext {
    /// Monotonic cycle number, starting at 1
    cycle: u64,
    /// When the cycle started
    started: Instant,
    /// Absolute deadline for all work in this cycle
    deadline: Instant,
}

impl CycleContext {
    /// Create a context whose deadline is `budget` from now
    ///
    /// Budgets too large for the clock saturate to a far-future deadline.
    pub fn new(cycle: u64, budget: Duration) -> Self {
        let started = Instant::now();
        let deadline = started
            .checked_add(budget)
            .unwrap_or_else(|| started + FAR_FUTURE);
        Self {
            cycle,
            started,
            deadline,
        }
    }

    /// Create a context with an explicit deadline
    pub fn with_deadline(cycle: u64, deadline: Instant) -> Self {
        Self {
            cycle,
            started: Instant::now(),
            deadline,
        }
    }

    /// The cycle number
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// The absolute deadline
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Time elapsed since the cycle started
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Time left before the deadline (zero once expired)
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Whether the deadline has passed
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Race `fut` against the deadline
    ///
    /// The future is dropped (cancelled) if the deadline passes first.
    pub async fn bound<F>(&self, fut: F) -> Result<F::Output, DeadlineExceeded>
    where
        F: Future,
    {
        tokio::time::timeout_at(self.deadline, fut)
            .await
            .map_err(|_| DeadlineExceeded)
    }
}
