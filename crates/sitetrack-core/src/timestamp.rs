//! Timestamp parsing for gateway dates
//!
//! The spreadsheet backend hands dates back in two families of shapes:
//!
//! - Day-first text typed by people: `4/3/2025`, `04/03/2025 10:15:00`
//! - Machine timestamps: `2025-03-04T10:15:00.000Z`, `2025-03-04 10:15:00`,
//!   `2025-03-04`, RFC 2822 (`Tue, 04 Mar 2025 10:15:00 GMT`) and the
//!   JavaScript `Date` string (`Tue Mar 04 2025 10:15:00 GMT-0500 (EST)`)
//!
//! Both are normalized to a `NaiveDateTime`. Day-first dates resolve to
//! midnight; the text after the first space is ignored. Values carrying an
//! offset are converted to UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

/// Point in time used throughout the aggregator
pub type Timestamp = NaiveDateTime;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// `Date.prototype.toString` once the ` (zone name)` suffix is dropped
const JS_DATE_FORMAT: &str = "%a %b %d %Y %H:%M:%S GMT%z";

/// Parse a gateway date.
///
/// Returns `None` for anything that is not a recognized calendar timestamp,
/// including impossible dates such as `31/02/2025`.
pub fn parse_timestamp(text: &str) -> Option<Timestamp> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if looks_day_first(text) {
        return parse_day_first(text);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.naive_utc());
    }

    if let Some(dt) = parse_js_date(text) {
        return Some(dt);
    }

    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

/// `d{1,2}/d{1,2}/dddd` at the start of the text
fn looks_day_first(text: &str) -> bool {
    let head = text.split(' ').next().unwrap_or_default();
    let mut parts = head.splitn(3, '/');
    let (Some(day), Some(month), Some(rest)) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    let year: String = rest.chars().take(4).collect();

    is_digits(day, 1..=2) && is_digits(month, 1..=2) && is_digits(&year, 4..=4)
}

fn parse_day_first(text: &str) -> Option<Timestamp> {
    let head = text.split(' ').next()?;
    let mut parts = head.split('/');
    let day: u32 = parts.next()?.parse().ok()?;
    let month: u32 = parts.next()?.parse().ok()?;
    let year: i32 = parts.next()?.parse().ok()?;

    if year <= 1900 {
        return None;
    }

    NaiveDate::from_ymd_opt(year, month, day).map(|d| d.and_time(NaiveTime::MIN))
}

fn parse_js_date(text: &str) -> Option<Timestamp> {
    let text = match text.find(" (") {
        Some(at) => &text[..at],
        None => text,
    };
    DateTime::parse_from_str(text.trim_end(), JS_DATE_FORMAT)
        .ok()
        .map(|dt| dt.naive_utc())
}

fn is_digits(s: &str, len: std::ops::RangeInclusive<usize>) -> bool {
    len.contains(&s.len()) && s.chars().all(|c| c.is_ascii_digit())
}
