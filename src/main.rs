//! # Bike Tracker
//!
//! GPS bike tracker that posts periodic location heartbeats over a cellular
//! link.
//!
//! Startup sequence: lamp animation, mobile link bring-up (retried forever),
//! GPS module configuration, then the tracking loop until power-off.

use anyhow::Result;
use tracing::info;
use tracing_subscriber;

mod error;
mod gps;
mod heartbeat;
mod indicator;
mod telemetry;
mod tracker;

use gps::SerialGpsReceiver;
use indicator::{startup_animation, LogIndicator};
use telemetry::CellularTransport;
use tracker::Tracker;

/// Main entry point for the Bike Tracker
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Set up logging with tracing subscriber
///    - Play the startup lamp animation
///    - Open the GPS serial port and send the PMTK configuration commands
///
/// 2. **Main Loop**
///    - Connect to the mobile network (infinite retry, no backoff)
///    - Tick forever: drain GPS, gate on fix validity, heartbeat when due
///
/// There is no shutdown state on the device; Ctrl+C exits the host process.
///
/// # Errors
///
/// Returns error if no GPS serial device can be opened or its configuration
/// commands cannot be written. Network failures never bubble up here.
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("== Bike Tracker v{} ==", env!("CARGO_PKG_VERSION"));

    let mut indicator = LogIndicator::new();
    startup_animation(&mut indicator).await;

    let mut receiver = SerialGpsReceiver::open()?;
    receiver.configure().await?;
    info!("GPS module configured (RMC+GGA, 1Hz)");

    let transport = CellularTransport::new();
    let mut tracker = Tracker::new(receiver, transport, indicator);

    tokio::select! {
        // The tracking loop never returns on its own
        _ = tracker.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
    }

    Ok(())
}
