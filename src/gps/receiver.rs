//! # GPS Receiver
//!
//! Serial-attached GPS module handling.
//!
//! This module handles:
//! - Opening the GPS serial port at 9600 baud
//! - Draining the serial line one character at a time into sentence frames
//! - Sending PMTK configuration commands at startup
//! - Maintaining the last-parsed navigation state
//!
//! The serial line must be drained on every loop tick or the UART buffer
//! overflows and sentences are silently dropped, so `drain` is cheap and
//! never blocks for more than the poll timeout.

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{timeout, Duration};
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info, warn};

use super::nmea::{parse_sentence, Sentence};
use super::report::{FixReport, Timestamp};
use crate::error::{Result, TrackerError};

/// GPS module baud rate (module default, changeable via PMTK command)
pub const GPS_BAUD_RATE: u32 = 9600;

/// Default GPS device paths to try (in order of preference)
const DEFAULT_DEVICE_PATHS: &[&str] = &[
    "/dev/ttyUSB0", // USB-to-serial adapters (most common for GPS breakouts)
    "/dev/ttyAMA0", // On-board UART
];

/// Emit RMC and GGA sentences only
pub const PMTK_SET_NMEA_OUTPUT_RMCGGA: &str =
    "$PMTK314,0,1,0,1,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0*28";

/// One position update per second
pub const PMTK_SET_NMEA_UPDATE_1HZ: &str = "$PMTK220,1000*1F";

/// Request antenna status reports
pub const PGCMD_ANTENNA: &str = "$PGCMD,33,1*6C";

/// Longest sentence the framer will accumulate before discarding
const MAX_SENTENCE_LEN: usize = 120;

/// How long `drain` waits for the next byte before deciding the line is idle
const DRAIN_POLL: Duration = Duration::from_millis(1);

/// Navigation state accumulated from parsed sentences.
///
/// RMC and GGA each carry a subset of the fields; the state merges them so a
/// fix report can snapshot the full picture.
#[derive(Debug, Clone, Default)]
pub struct GpsState {
    pub day: u8,
    pub month: u8,
    pub year: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub fix: bool,
    pub fix_quality: u8,
    pub latitude: f64,
    pub lat_hemisphere: char,
    pub longitude: f64,
    pub lon_hemisphere: char,
    pub speed_knots: f64,
    pub course_deg: f64,
    pub altitude_m: f64,
    pub satellite_count: u8,
}

impl GpsState {
    /// Merge one parsed sentence into the state
    pub fn apply(&mut self, sentence: &Sentence) {
        match sentence {
            Sentence::Rmc(rmc) => {
                self.hour = rmc.time.hour;
                self.minute = rmc.time.minute;
                self.second = rmc.time.second;
                self.day = rmc.date.day;
                self.month = rmc.date.month;
                self.year = rmc.date.year;
                self.fix = rmc.status_active;
                self.latitude = rmc.latitude;
                self.lat_hemisphere = rmc.lat_hemisphere;
                self.longitude = rmc.longitude;
                self.lon_hemisphere = rmc.lon_hemisphere;
                self.speed_knots = rmc.speed_knots;
                self.course_deg = rmc.course_deg;
            }
            Sentence::Gga(gga) => {
                self.hour = gga.time.hour;
                self.minute = gga.time.minute;
                self.second = gga.time.second;
                self.fix = gga.fix_quality > 0;
                self.fix_quality = gga.fix_quality;
                self.latitude = gga.latitude;
                self.lat_hemisphere = gga.lat_hemisphere;
                self.longitude = gga.longitude;
                self.lon_hemisphere = gga.lon_hemisphere;
                self.altitude_m = gga.altitude_m;
                self.satellite_count = gga.satellite_count;
            }
        }
    }

    /// Current date/time fields as a timestamp
    pub fn timestamp(&self) -> Timestamp {
        Timestamp {
            day: self.day,
            month: self.month,
            year: self.year,
            hour: self.hour,
            minute: self.minute,
            second: self.second,
        }
    }

    /// Snapshot the state as a fix report.
    ///
    /// Callers must only do this when `fix` is true; the update processor is
    /// the single construction site.
    pub fn fix_report(&self) -> FixReport {
        FixReport {
            timestamp: self.timestamp(),
            fix_quality: self.fix_quality,
            latitude: self.latitude,
            lat_hemisphere: if self.lat_hemisphere == '\0' {
                'N'
            } else {
                self.lat_hemisphere
            },
            longitude: self.longitude,
            lon_hemisphere: if self.lon_hemisphere == '\0' {
                'E'
            } else {
                self.lon_hemisphere
            },
            speed_knots: self.speed_knots,
            course_deg: self.course_deg,
            altitude_m: self.altitude_m,
            satellite_count: self.satellite_count,
        }
    }
}

/// GPS receiver collaborator contract.
///
/// The control loop owns the receiver and calls `drain` first on every tick;
/// the update processor then asks for the buffered sentence, if any.
#[async_trait]
pub trait Receiver: Send {
    /// Pull pending bytes off the serial line into the sentence framer.
    /// Returns without blocking when the line is idle.
    async fn drain(&mut self);

    /// Whether a complete sentence is waiting to be consumed
    fn has_new_sentence(&self) -> bool;

    /// Take the buffered sentence, clearing the new-sentence flag
    fn latest_sentence(&mut self) -> Option<String>;

    /// Parse one sentence, merging its fields into the navigation state.
    /// Returns false (and leaves the state untouched) on any parse failure.
    fn parse(&mut self, sentence: &str) -> bool;

    /// Last-parsed navigation state
    fn state(&self) -> &GpsState;
}

/// Serial-attached GPS receiver.
///
/// Generic over the byte stream so the framing logic is testable against an
/// in-memory buffer.
pub struct SerialGpsReceiver<P> {
    port: P,
    /// Sentence in progress (between `$` and the terminating newline)
    line: String,
    /// Complete sentence awaiting consumption by the update processor
    pending: Option<String>,
    state: GpsState,
}

impl SerialGpsReceiver<tokio_serial::SerialStream> {
    /// Open the GPS module, trying the default device paths in order
    ///
    /// # Errors
    ///
    /// Returns error if no GPS device can be opened
    pub fn open() -> Result<Self> {
        Self::open_with_paths(DEFAULT_DEVICE_PATHS)
    }

    /// Open the GPS module at one of the given device paths
    pub fn open_with_paths(paths: &[&str]) -> Result<Self> {
        for path in paths {
            debug!("Trying to open GPS serial port: {}", path);

            match tokio_serial::new(*path, GPS_BAUD_RATE)
                .data_bits(tokio_serial::DataBits::Eight)
                .parity(tokio_serial::Parity::None)
                .stop_bits(tokio_serial::StopBits::One)
                .flow_control(tokio_serial::FlowControl::None)
                .open_native_async()
            {
                Ok(port) => {
                    info!("Successfully opened GPS device at {}", path);
                    return Ok(Self::from_port(port));
                }
                Err(e) => {
                    warn!("Failed to open {}: {}", path, e);
                    continue;
                }
            }
        }

        Err(TrackerError::SerialPortNotFound(paths.join(", ")))
    }
}

impl<P: AsyncRead + AsyncWrite + Unpin + Send> SerialGpsReceiver<P> {
    /// Wrap an already-open byte stream
    pub fn from_port(port: P) -> Self {
        Self {
            port,
            line: String::new(),
            pending: None,
            state: GpsState::default(),
        }
    }

    /// Send the startup configuration commands to the module:
    /// RMC+GGA output only, 1 Hz update rate, antenna status reports.
    ///
    /// Command set reference: <https://www.adafruit.com/datasheets/PMTK_A08.pdf>
    pub async fn configure(&mut self) -> Result<()> {
        self.send_command(PMTK_SET_NMEA_OUTPUT_RMCGGA).await?;
        self.send_command(PMTK_SET_NMEA_UPDATE_1HZ).await?;
        self.send_command(PGCMD_ANTENNA).await?;
        Ok(())
    }

    /// Write one command sentence followed by CRLF
    pub async fn send_command(&mut self, command: &str) -> Result<()> {
        self.port
            .write_all(command.as_bytes())
            .await
            .map_err(|e| TrackerError::Serial(format!("Failed to write command: {}", e)))?;
        self.port
            .write_all(b"\r\n")
            .await
            .map_err(|e| TrackerError::Serial(format!("Failed to write command: {}", e)))?;
        self.port
            .flush()
            .await
            .map_err(|e| TrackerError::Serial(format!("Failed to flush serial port: {}", e)))?;

        debug!("Sent GPS command: {}", command);
        Ok(())
    }

    /// Feed one byte into the sentence framer
    fn feed(&mut self, byte: u8) {
        match byte {
            b'\r' => {}
            b'\n' => {
                if self.line.starts_with('$') {
                    self.pending = Some(std::mem::take(&mut self.line));
                } else {
                    // Noise or a fragment from mid-sentence startup
                    self.line.clear();
                }
            }
            _ => {
                if self.line.len() >= MAX_SENTENCE_LEN {
                    // Runaway line with no terminator; discard and resync
                    self.line.clear();
                }
                self.line.push(byte as char);
            }
        }
    }
}

#[async_trait]
impl<P: AsyncRead + AsyncWrite + Unpin + Send> Receiver for SerialGpsReceiver<P> {
    async fn drain(&mut self) {
        let mut byte = [0u8; 1];

        // Stop at one buffered sentence so this tick consumes it before the
        // framer starts on the next one.
        while self.pending.is_none() {
            match timeout(DRAIN_POLL, self.port.read(&mut byte)).await {
                Ok(Ok(n)) if n > 0 => self.feed(byte[0]),
                // EOF, read error or idle line: nothing more this tick
                _ => break,
            }
        }
    }

    fn has_new_sentence(&self) -> bool {
        self.pending.is_some()
    }

    fn latest_sentence(&mut self) -> Option<String> {
        self.pending.take()
    }

    fn parse(&mut self, sentence: &str) -> bool {
        match parse_sentence(sentence) {
            Ok(parsed) => {
                self.state.apply(&parsed);
                true
            }
            Err(e) => {
                debug!("Discarding sentence ({}): {}", e, sentence.trim_end());
                false
            }
        }
    }

    fn state(&self) -> &GpsState {
        &self.state
    }
}
