//! # Heartbeat Publisher
//!
//! Serializes a fix report into the three-key heartbeat form payload and
//! pushes it through the transport. Delivery is fire-and-forget: the
//! response body is counted, never interpreted, and a failed POST is simply
//! reported to the caller — the next due heartbeat is the only retry.

use tracing::{debug, info};

use super::transport::{Transport, TransportError};
use crate::gps::FixReport;

/// Where heartbeats are POSTed
pub const HEARTBEAT_ENDPOINT: &str = "http://httpbin.org/post";

/// Build the ordered heartbeat payload: `location`, `speed`, `angle`.
///
/// Coordinates render as `%.4f` degrees with the hemisphere character
/// appended; speed and angle as plain decimal strings.
pub fn heartbeat_payload(report: &FixReport) -> [(&'static str, String); 3] {
    let location = format!(
        "{:5.4}{}, {:5.4}{}",
        report.latitude, report.lat_hemisphere, report.longitude, report.lon_hemisphere
    );
    let speed = format!("{:.6}", report.speed_knots);
    let angle = format!("{:.6}", report.course_deg);

    [("location", location), ("speed", speed), ("angle", angle)]
}

/// Send one heartbeat for `report`.
///
/// Blocks until the transport returns. On success the result is the number
/// of bytes read from the response body.
pub async fn publish<T: Transport + ?Sized>(
    transport: &mut T,
    report: &FixReport,
) -> Result<usize, TransportError> {
    let payload = heartbeat_payload(report);

    info!("Sending heartbeat");
    let body = transport.post_form(HEARTBEAT_ENDPOINT, &payload).await?;

    debug!("Response: {}", body);
    Ok(body.len())
}
