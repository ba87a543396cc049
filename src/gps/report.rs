//! # Fix Report
//!
//! Snapshot of a validated GPS fix, produced once per successfully parsed
//! sentence that carried an active fix flag and consumed within the same tick.

use std::fmt;

/// UTC date and time fields as reported by the receiver.
///
/// The year is the two-digit NMEA value; no calendar validation is performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Timestamp {
    pub day: u8,
    pub month: u8,
    /// Two-digit year (e.g. 26 for 2026)
    pub year: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/20{:02} {:02}:{:02}:{:02}",
            self.day, self.month, self.year, self.hour, self.minute, self.second
        )
    }
}

/// A validated positioning fix.
///
/// Only ever constructed from a sentence that both parsed successfully and
/// carried an active fix flag. Latitude and longitude are decimal degrees,
/// kept positive; the hemisphere is carried separately so the telemetry
/// payload can render `"%.4f%c"` pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct FixReport {
    pub timestamp: Timestamp,
    /// GGA fix quality indicator (0 = invalid, 1 = GPS, 2 = DGPS, ...)
    pub fix_quality: u8,
    /// Decimal degrees, always non-negative
    pub latitude: f64,
    /// Hemisphere character, `N` or `S`
    pub lat_hemisphere: char,
    /// Decimal degrees, always non-negative
    pub longitude: f64,
    /// Hemisphere character, `E` or `W`
    pub lon_hemisphere: char,
    /// Ground speed in knots
    pub speed_knots: f64,
    /// Course over ground in degrees
    pub course_deg: f64,
    /// Altitude above mean sea level in meters
    pub altitude_m: f64,
    /// Number of satellites used in the solution
    pub satellite_count: u8,
}

impl fmt::Display for FixReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}. Quality: {}, Location: {:5.4}{}, {:5.4}{}, Speed: {:5.2} knots, \
             Angle: {:5.2}, Altitude: {:5.2}, Satellites: {}",
            self.timestamp,
            self.fix_quality,
            self.latitude,
            self.lat_hemisphere,
            self.longitude,
            self.lon_hemisphere,
            self.speed_knots,
            self.course_deg,
            self.altitude_m,
            self.satellite_count
        )
    }
}
