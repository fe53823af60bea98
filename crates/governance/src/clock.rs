//! Period clock collaborator
//!
//! Time only enters the engine through this interface, so every timing
//! window is deterministic under test: advance a [`ManualClock`] instead of
//! the system clock.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};

/// Source of the current governance period. Strictly non-decreasing
/// across calls.
pub trait PeriodClock: Send + Sync {
    fn current_period(&self) -> u64;
}

/// Wall-clock-backed period clock: `floor((now - start) / period_duration)`.
pub struct SystemPeriodClock {
    start: DateTime<Utc>,
    period_duration_secs: u64,
}

impl SystemPeriodClock {
    /// A clock whose period zero began at `start`.
    pub fn new(start: DateTime<Utc>, period_duration_secs: u64) -> Self {
        assert!(period_duration_secs > 0, "period duration cannot be zero");
        Self {
            start,
            period_duration_secs,
        }
    }

    /// A clock whose period zero begins now.
    pub fn starting_now(period_duration_secs: u64) -> Self {
        Self::new(Utc::now(), period_duration_secs)
    }
}

impl PeriodClock for SystemPeriodClock {
    fn current_period(&self) -> u64 {
        let elapsed = (Utc::now() - self.start).num_seconds().max(0) as u64;
        elapsed / self.period_duration_secs
    }
}

/// Manually advanced clock for tests and embedding.
#[derive(Debug, Default)]
pub struct ManualClock {
    period: AtomicU64,
}

impl ManualClock {
    /// A clock at period zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move forward by `periods`.
    pub fn advance(&self, periods: u64) {
        self.period.fetch_add(periods, Ordering::SeqCst);
    }
}

impl PeriodClock for ManualClock {
    fn current_period(&self) -> u64 {
        self.period.load(Ordering::SeqCst)
    }
}
