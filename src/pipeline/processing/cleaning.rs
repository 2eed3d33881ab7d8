use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::constants::MAGNITUDE_UNIT_SUFFIX;
use crate::types::{CleanEvent, RawEvent};

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Turns a raw row into a clean event, or `None` when the row is rejected.
///
/// Every field is parsed independently. The row is kept iff both the
/// magnitude and the latitude parse; a missing longitude or timestamp only
/// leaves that field empty. Rejection is a normal data-quality outcome, so
/// nothing is logged here.
pub fn clean(raw: &RawEvent) -> Option<CleanEvent> {
    let event_time = parse_timestamp(&raw.time);
    let latitude = parse_float(&raw.latitude);
    let longitude = parse_float(&raw.longitude);
    let magnitude = parse_magnitude(&raw.magnitude_raw);

    let (Some(magnitude), Some(latitude)) = (magnitude, latitude) else {
        return None;
    };

    Some(CleanEvent {
        event_id: raw.event_id.clone(),
        event_time,
        latitude,
        longitude,
        magnitude,
        depth_km: raw.depth_km,
        tsunami_alert: raw.tsunami_flag == 1,
    })
}

/// Parses an ISO-8601-like timestamp without shifting it to another zone.
///
/// Offsets are accepted but dropped: the wall-clock value the feed reported is
/// kept, so day truncation happens in the source's own reference.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let without_zulu = s.strip_suffix(&['Z', 'z'][..]).unwrap_or(s);
    for fmt in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(without_zulu, fmt) {
            return Some(ts);
        }
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.naive_local());
    }

    NaiveDate::parse_from_str(without_zulu, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Parses a coordinate-like value. Empty, non-numeric and non-finite text
/// yields `None`.
pub fn parse_float(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Strips the trailing unit marker and parses what is left.
pub fn parse_magnitude(s: &str) -> Option<f64> {
    let stripped = s.trim().trim_end_matches(MAGNITUDE_UNIT_SUFFIX);
    parse_float(stripped)
}
