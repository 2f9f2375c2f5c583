use chrono::{DateTime, NaiveDateTime};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Could not parse '{0}' as a booking timestamp")]
pub struct TimeParseError(pub String);

/// Parses the timestamps stored on booking rows. Front ends submit either a space-separated form
/// (`2024-05-01 10:30` or `2024-05-01 10:30:00`) or an ISO-8601 form (`2024-05-01T10:30:00`,
/// optionally zoned). Zoned values are converted to their naive UTC equivalent.
pub fn parse_booking_time(value: &str) -> Result<NaiveDateTime, TimeParseError> {
    let v = value.trim();
    if let Ok(t) = NaiveDateTime::parse_from_str(v, "%Y-%m-%d %H:%M:%S") {
        return Ok(t);
    }
    if let Ok(t) = NaiveDateTime::parse_from_str(v, "%Y-%m-%d %H:%M") {
        return Ok(t);
    }
    let unzoned = v.replace('T', " ");
    if let Ok(t) = NaiveDateTime::parse_from_str(&unzoned, "%Y-%m-%d %H:%M:%S") {
        return Ok(t);
    }
    if let Ok(t) = NaiveDateTime::parse_from_str(&unzoned, "%Y-%m-%d %H:%M") {
        return Ok(t);
    }
    if let Ok(t) = DateTime::parse_from_rfc3339(v) {
        return Ok(t.naive_utc());
    }
    Err(TimeParseError(value.to_string()))
}
