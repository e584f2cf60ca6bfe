//! Frame creation timestamps
//!
//! Photo files are often named after the moment they were taken. A stem that parses
//! as an ISO 8601 timestamp wins; otherwise the file modification time is used, and
//! failing that the current time. Timestamps without an offset are taken as UTC.

use crate::storage::Location;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::fs;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO 8601 date or date-time.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Best-effort creation time of the image at `location`.
pub fn created_at(location: &Location) -> DateTime<Utc> {
    if let Some(ts) = location.file_stem().and_then(parse_timestamp) {
        return ts;
    }
    location
        .as_local_path()
        .and_then(|path| fs::metadata(path).ok())
        .and_then(|meta| meta.modified().ok())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(Utc::now)
}
