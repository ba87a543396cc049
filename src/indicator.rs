//! # Status Indicator Driver
//!
//! Four independent lamps on the enclosure, pure output. Each lamp reflects
//! one condition and persists until something explicitly changes it; there
//! are no shared invariants between them.

use tokio::time::{sleep, Duration};
use tracing::debug;

/// Delay between startup animation steps
const ANIMATION_STEP: Duration = Duration::from_millis(100);

/// The four status lamps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lamp {
    /// Mobile network link established (set once at startup, never cleared)
    NetworkLink,
    /// The last positioning update carried a valid fix
    FixAcquired,
    /// A heartbeat attempt has begun; decays a second after the cycle
    HeartbeatInFlight,
    /// The last heartbeat POST failed
    TxError,
}

impl Lamp {
    /// All lamps in panel order
    pub const ALL: [Lamp; 4] = [
        Lamp::NetworkLink,
        Lamp::FixAcquired,
        Lamp::HeartbeatInFlight,
        Lamp::TxError,
    ];
}

/// Status indicator collaborator contract: boolean outputs, no feedback
pub trait StatusIndicator: Send {
    /// Drive one lamp on or off
    fn set(&mut self, lamp: Lamp, on: bool);
}

/// Indicator that mirrors lamp changes to the log.
///
/// Stands in for the GPIO-driven panel on hosts without one; only actual
/// transitions are logged.
#[derive(Debug, Default)]
pub struct LogIndicator {
    lamps: [bool; 4],
}

impl LogIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of one lamp
    pub fn is_lit(&self, lamp: Lamp) -> bool {
        self.lamps[lamp as usize]
    }
}

impl StatusIndicator for LogIndicator {
    fn set(&mut self, lamp: Lamp, on: bool) {
        let slot = &mut self.lamps[lamp as usize];
        if *slot != on {
            *slot = on;
            debug!("Lamp {:?} -> {}", lamp, if on { "on" } else { "off" });
        }
    }
}

/// Play the fixed boot animation: one lamp at a time, across the panel and
/// back, 100 ms per step, everything off at the end. Pure presentation; the
/// main loop starts only after it completes.
pub async fn startup_animation<I: StatusIndicator + ?Sized>(indicator: &mut I) {
    const SWEEP: [Lamp; 7] = [
        Lamp::NetworkLink,
        Lamp::FixAcquired,
        Lamp::HeartbeatInFlight,
        Lamp::TxError,
        Lamp::HeartbeatInFlight,
        Lamp::FixAcquired,
        Lamp::NetworkLink,
    ];

    for lamp in Lamp::ALL {
        indicator.set(lamp, false);
    }
    sleep(ANIMATION_STEP).await;

    let mut previous: Option<Lamp> = None;
    for lamp in SWEEP {
        if let Some(prev) = previous {
            indicator.set(prev, false);
        }
        indicator.set(lamp, true);
        sleep(ANIMATION_STEP).await;
        previous = Some(lamp);
    }

    if let Some(prev) = previous {
        indicator.set(prev, false);
    }
}
