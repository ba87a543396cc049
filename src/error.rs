//! # Error Types
//!
//! Custom error types for Bike Tracker using `thiserror`.

use thiserror::Error;

/// Main error type for Bike Tracker
#[derive(Debug, Error)]
pub enum TrackerError {
    /// GPS serial line errors
    #[error("Serial error: {0}")]
    Serial(String),

    /// No GPS device found at any known path
    #[error("GPS serial port not found, tried: {0}")]
    SerialPortNotFound(String),

    /// Cellular transport errors (connect or POST)
    #[error("Transport error: {0}")]
    Transport(#[from] crate::telemetry::TransportError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Bike Tracker
pub type Result<T> = std::result::Result<T, TrackerError>;
