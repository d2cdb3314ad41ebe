//! Timestamp parsing and formatting shared by forms, storage and views.
//!
//! Storage format is RFC 3339 UTC with second precision (`2024-03-01T08:30:00Z`)
//! so that string comparison in SQL matches chronological order.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone, Utc};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Parse a user- or database-supplied instant.
///
/// Accepts RFC 3339 with offset, `datetime-local` input values (interpreted
/// as UTC) and bare dates (midnight UTC). Returns `None` for anything else.
pub fn parse_instant(input: &str) -> Option<DateTime<Utc>> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|d| Utc.from_utc_datetime(&d.and_time(NaiveTime::MIN)))
}

/// Canonical storage representation.
pub fn format_instant(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Value suitable for an `<input type="datetime-local">`.
pub fn to_input_value(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M").to_string()
}

/// Human-readable rendering for list views.
pub fn display(dt: &DateTime<Utc>) -> String {
    dt.format("%d/%m/%Y %H:%M").to_string()
}

pub fn display_opt(dt: Option<&DateTime<Utc>>) -> String {
    dt.map(display).unwrap_or_else(|| "-".to_string())
}

/// Inclusive storage-format bounds covering one UTC day.
pub fn day_bounds(day: NaiveDate) -> (String, String) {
    let start = Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN));
    let end = start + chrono::Duration::days(1) - chrono::Duration::seconds(1);
    (format_instant(&start), format_instant(&end))
}
