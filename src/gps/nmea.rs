//! # NMEA Sentence Parsing
//!
//! Checksum validation and field extraction for the two sentence types the
//! GPS module is configured to emit: `RMC` (recommended minimum) and `GGA`
//! (fix data). Anything else is rejected as unsupported.
//!
//! Coordinates arrive as `ddmm.mmmm` degree-minutes and are converted to
//! decimal degrees, kept non-negative with the hemisphere character carried
//! separately.

use thiserror::Error;

/// NMEA sentence parse failures.
///
/// These never escape a tick: the update processor maps every variant to a
/// "no update" outcome and keeps polling.
#[derive(Debug, Error, PartialEq)]
pub enum NmeaError {
    /// Sentence shorter than the minimum `$X*CC` frame
    #[error("Sentence too short")]
    TooShort,

    /// No `*` checksum delimiter found
    #[error("Missing checksum delimiter")]
    MissingChecksum,

    /// Checksum digits present but wrong
    #[error("Checksum mismatch: expected 0x{expected:02X}, got 0x{got:02X}")]
    Checksum { expected: u8, got: u8 },

    /// Sentence type is not RMC or GGA
    #[error("Unsupported sentence type: {0}")]
    Unsupported(String),

    /// A field failed to parse as its expected shape
    #[error("Malformed field: {0}")]
    Field(&'static str),
}

/// Hour/minute/second triple from the `hhmmss.sss` time field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UtcTime {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

/// Day/month/year triple from the RMC `ddmmyy` date field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UtcDate {
    pub day: u8,
    pub month: u8,
    /// Two-digit year
    pub year: u8,
}

/// Parsed RMC sentence fields
#[derive(Debug, Clone, PartialEq)]
pub struct RmcData {
    pub time: UtcTime,
    pub date: UtcDate,
    /// True when the status field is `A` (active), false for `V` (void)
    pub status_active: bool,
    pub latitude: f64,
    pub lat_hemisphere: char,
    pub longitude: f64,
    pub lon_hemisphere: char,
    pub speed_knots: f64,
    pub course_deg: f64,
}

/// Parsed GGA sentence fields
#[derive(Debug, Clone, PartialEq)]
pub struct GgaData {
    pub time: UtcTime,
    pub latitude: f64,
    pub lat_hemisphere: char,
    pub longitude: f64,
    pub lon_hemisphere: char,
    pub fix_quality: u8,
    pub satellite_count: u8,
    pub altitude_m: f64,
}

/// A successfully parsed sentence
#[derive(Debug, Clone, PartialEq)]
pub enum Sentence {
    Rmc(RmcData),
    Gga(GgaData),
}

/// Validate the XOR checksum of a complete sentence
///
/// The checksum covers every byte between `$` and `*` and is compared
/// against the two hex digits that follow the `*`. Trailing `\r\n` is
/// tolerated.
///
/// # Arguments
///
/// * `sentence` - Complete sentence text, starting with `$`
///
/// # Returns
///
/// * `Result<(), NmeaError>` - Ok if the checksum matches
pub fn validate(sentence: &str) -> Result<(), NmeaError> {
    let trimmed = sentence.trim_end();
    if trimmed.len() < 4 || !trimmed.starts_with('$') {
        return Err(NmeaError::TooShort);
    }

    let star = trimmed.rfind('*').ok_or(NmeaError::MissingChecksum)?;
    let digits = trimmed
        .get(star + 1..star + 3)
        .ok_or(NmeaError::MissingChecksum)?;
    let got = u8::from_str_radix(digits, 16).map_err(|_| NmeaError::Field("checksum digits"))?;

    let mut expected: u8 = 0;
    for byte in trimmed[1..star].bytes() {
        expected ^= byte;
    }

    if expected != got {
        return Err(NmeaError::Checksum { expected, got });
    }

    Ok(())
}

/// Parse a complete sentence into its typed representation
///
/// Validates the checksum, then dispatches on the three-letter sentence
/// type (the two-letter talker prefix is ignored, so `GPRMC` and `GNRMC`
/// are both RMC).
///
/// # Arguments
///
/// * `sentence` - Complete sentence text, starting with `$`
///
/// # Returns
///
/// * `Result<Sentence, NmeaError>` - Parsed sentence, or why it was rejected
pub fn parse_sentence(sentence: &str) -> Result<Sentence, NmeaError> {
    validate(sentence)?;

    let trimmed = sentence.trim_end();
    let star = trimmed.rfind('*').ok_or(NmeaError::MissingChecksum)?;
    let fields: Vec<&str> = trimmed[1..star].split(',').collect();

    let kind = fields[0];
    if kind.len() < 5 {
        return Err(NmeaError::Unsupported(kind.to_string()));
    }

    match &kind[2..5] {
        "RMC" => parse_rmc(&fields).map(Sentence::Rmc),
        "GGA" => parse_gga(&fields).map(Sentence::Gga),
        other => Err(NmeaError::Unsupported(other.to_string())),
    }
}

/// RMC field layout: type, time, status, lat, N/S, lon, E/W, speed, course, date, ...
fn parse_rmc(fields: &[&str]) -> Result<RmcData, NmeaError> {
    if fields.len() < 10 {
        return Err(NmeaError::Field("RMC field count"));
    }

    Ok(RmcData {
        time: parse_time(fields[1])?,
        status_active: fields[2] == "A",
        latitude: parse_coordinate(fields[3], 2)?,
        lat_hemisphere: hemisphere(fields[4], 'N'),
        longitude: parse_coordinate(fields[5], 3)?,
        lon_hemisphere: hemisphere(fields[6], 'E'),
        speed_knots: parse_float(fields[7])?,
        course_deg: parse_float(fields[8])?,
        date: parse_date(fields[9])?,
    })
}

/// GGA field layout: type, time, lat, N/S, lon, E/W, quality, satellites, hdop, altitude, ...
fn parse_gga(fields: &[&str]) -> Result<GgaData, NmeaError> {
    if fields.len() < 10 {
        return Err(NmeaError::Field("GGA field count"));
    }

    let fix_quality = if fields[6].is_empty() {
        0
    } else {
        fields[6]
            .parse::<u8>()
            .map_err(|_| NmeaError::Field("fix quality"))?
    };

    let satellite_count = if fields[7].is_empty() {
        0
    } else {
        fields[7]
            .parse::<u8>()
            .map_err(|_| NmeaError::Field("satellite count"))?
    };

    Ok(GgaData {
        time: parse_time(fields[1])?,
        latitude: parse_coordinate(fields[2], 2)?,
        lat_hemisphere: hemisphere(fields[3], 'N'),
        longitude: parse_coordinate(fields[4], 3)?,
        lon_hemisphere: hemisphere(fields[5], 'E'),
        fix_quality,
        satellite_count,
        altitude_m: parse_float(fields[9])?,
    })
}

/// Parse `hhmmss.sss`; empty field means the receiver has no time yet
fn parse_time(field: &str) -> Result<UtcTime, NmeaError> {
    if field.is_empty() {
        return Ok(UtcTime::default());
    }
    if field.len() < 6 {
        return Err(NmeaError::Field("time"));
    }

    Ok(UtcTime {
        hour: parse_u8(&field[0..2], "time hour")?,
        minute: parse_u8(&field[2..4], "time minute")?,
        second: parse_u8(&field[4..6], "time second")?,
    })
}

/// Parse `ddmmyy`; empty field means the receiver has no date yet
fn parse_date(field: &str) -> Result<UtcDate, NmeaError> {
    if field.is_empty() {
        return Ok(UtcDate::default());
    }
    if field.len() < 6 {
        return Err(NmeaError::Field("date"));
    }

    Ok(UtcDate {
        day: parse_u8(&field[0..2], "date day")?,
        month: parse_u8(&field[2..4], "date month")?,
        year: parse_u8(&field[4..6], "date year")?,
    })
}

/// Convert a `ddmm.mmmm` coordinate field to decimal degrees
///
/// `degree_digits` is 2 for latitude and 3 for longitude. An empty field
/// (no fix yet) yields 0.0. The result is always non-negative; hemisphere
/// sign handling is the consumer's concern.
fn parse_coordinate(field: &str, degree_digits: usize) -> Result<f64, NmeaError> {
    if field.is_empty() {
        return Ok(0.0);
    }
    if field.len() < degree_digits + 2 {
        return Err(NmeaError::Field("coordinate"));
    }

    let degrees = field[..degree_digits]
        .parse::<f64>()
        .map_err(|_| NmeaError::Field("coordinate degrees"))?;
    let minutes = field[degree_digits..]
        .parse::<f64>()
        .map_err(|_| NmeaError::Field("coordinate minutes"))?;

    Ok(degrees + minutes / 60.0)
}

fn parse_float(field: &str) -> Result<f64, NmeaError> {
    if field.is_empty() {
        return Ok(0.0);
    }
    field
        .parse::<f64>()
        .map_err(|_| NmeaError::Field("decimal value"))
}

fn parse_u8(text: &str, what: &'static str) -> Result<u8, NmeaError> {
    text.parse::<u8>().map_err(|_| NmeaError::Field(what))
}

fn hemisphere(field: &str, default: char) -> char {
    field.chars().next().unwrap_or(default)
}
