//! # Telemetry Module
//!
//! Heartbeat transmission over the cellular data link.
//!
//! This module handles:
//! - The `Transport` collaborator contract (connect + form POST)
//! - The reqwest-backed cellular transport
//! - Serializing fix reports into the heartbeat payload
//! - Interpreting POST success/failure for the control loop

pub mod publisher;
pub mod transport;

pub use publisher::{heartbeat_payload, publish, HEARTBEAT_ENDPOINT};
pub use transport::{CellularTransport, Credentials, Transport, TransportError, APN_CREDENTIALS};
