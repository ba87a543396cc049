//! # GPS Module
//!
//! Positioning update handling.
//!
//! This module handles:
//! - NMEA sentence validation and parsing (RMC, GGA)
//! - Serial receiver framing and PMTK startup configuration
//! - Gating raw updates on fix validity
//! - Producing `FixReport` snapshots for the telemetry publisher

pub mod nmea;
pub mod receiver;
pub mod report;

pub use receiver::{GpsState, Receiver, SerialGpsReceiver};
pub use report::{FixReport, Timestamp};

/// Outcome of polling the receiver for one tick
#[derive(Debug, Clone, PartialEq)]
pub enum GpsUpdate {
    /// Nothing new arrived, or what arrived failed to parse
    None,
    /// A sentence parsed but the receiver has no fix; the timestamp is
    /// carried for diagnostic display only
    NoFix(Timestamp),
    /// A sentence parsed with an active fix
    Fix(FixReport),
}

impl GpsUpdate {
    /// Whether this tick produced a valid fix report
    pub fn is_fix(&self) -> bool {
        matches!(self, GpsUpdate::Fix(_))
    }
}

/// Poll the receiver for one tick's positioning update.
///
/// Asks the receiver whether a complete sentence arrived; parse failures are
/// swallowed (the loop just keeps polling) and never mutate receiver state.
/// A `FixReport` comes out iff the sentence parsed and the fix flag was
/// active at parse time.
pub fn poll_update<R: Receiver + ?Sized>(receiver: &mut R) -> GpsUpdate {
    if !receiver.has_new_sentence() {
        return GpsUpdate::None;
    }

    let Some(sentence) = receiver.latest_sentence() else {
        return GpsUpdate::None;
    };

    if !receiver.parse(&sentence) {
        return GpsUpdate::None;
    }

    let state = receiver.state();
    if state.fix {
        GpsUpdate::Fix(state.fix_report())
    } else {
        GpsUpdate::NoFix(state.timestamp())
    }
}
