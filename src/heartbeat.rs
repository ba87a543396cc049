//! # Heartbeat Scheduler
//!
//! Owns the elapsed-time counter that gates telemetry transmissions.
//!
//! A heartbeat is due only when the current tick produced a valid fix AND the
//! period has elapsed; a fix-less tick never triggers one no matter how much
//! time has passed. The caller resets the timer immediately after every
//! attempt, success or failure, which caps attempt frequency at one per
//! period regardless of network outcome.

use tokio::time::{Duration, Instant};

/// Seconds between heartbeat transmissions
pub const HEARTBEAT_PERIOD_S: u64 = 10;

/// Seconds after a reset before the transient status lamps decay
const DECAY_AFTER_S: u64 = 1;

/// Elapsed-time counter with a fixed period threshold.
///
/// Uses the tokio clock so tests can run under paused time.
#[derive(Debug)]
pub struct HeartbeatTimer {
    last_reset: Instant,
    period: Duration,
}

impl HeartbeatTimer {
    /// Start a timer with the standard heartbeat period
    pub fn start() -> Self {
        Self::with_period(Duration::from_secs(HEARTBEAT_PERIOD_S))
    }

    /// Start a timer with a custom period
    pub fn with_period(period: Duration) -> Self {
        Self {
            last_reset: Instant::now(),
            period,
        }
    }

    /// Time since the last reset
    pub fn elapsed(&self) -> Duration {
        self.last_reset.elapsed()
    }

    /// Whether a heartbeat should fire this tick.
    ///
    /// `report_present` is whether the current tick produced a valid fix
    /// report; without one the answer is always no.
    pub fn is_due(&self, report_present: bool) -> bool {
        report_present && self.elapsed() >= self.period
    }

    /// Whether the transient status lamps should decay.
    ///
    /// Independent of fix validity: true once at least one second has passed
    /// since the last reset.
    pub fn decay_due(&self) -> bool {
        self.elapsed() >= Duration::from_secs(DECAY_AFTER_S)
    }

    /// Restart the elapsed counter. Called by the control loop immediately
    /// after a heartbeat attempt, whatever its outcome.
    pub fn reset(&mut self) {
        self.last_reset = Instant::now();
    }
}
