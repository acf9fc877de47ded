//! Lenient ISO-8601 parsing for the date-valued fields of archived records.
//!
//! Historical documents are inconsistent: some carry full timestamps with a
//! `Z` suffix, some carry offsets, some only a calendar date, and a few carry
//! free text. Anything that does not parse degrades to `None`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse an ISO-8601 date or timestamp, returning `None` when the text is
/// absent, empty, or unparseable.
#[must_use]
pub fn parse_lenient(text: Option<&str>) -> Option<DateTime<Utc>> {
    let text = text?.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    let without_zone = text.strip_suffix('Z').unwrap_or(text);
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(without_zone, format) {
            return Some(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(without_zone, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }

    log::debug!("Unparseable date value {text:?}, storing NULL");
    None
}

/// Parse leniently and render as RFC 3339 for storage in a TEXT column.
#[must_use]
pub fn to_column(text: Option<&str>) -> Option<String> {
    parse_lenient(text).map(|dt| dt.to_rfc3339())
}
