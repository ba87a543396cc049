//! # Bike Tracker Library
//!
//! GPS bike tracker that posts periodic location heartbeats over a cellular
//! link.
//!
//! This library provides the core fix-acquisition and heartbeat-scheduling
//! loop: it drains the GPS serial stream, gates updates on fix validity,
//! decides when a heartbeat is due, publishes it, and drives the status
//! lamp panel from the outcome.

pub mod error;
pub mod gps;
pub mod heartbeat;
pub mod indicator;
pub mod telemetry;
pub mod tracker;
