//! # Date Coercion
//!
//! Turns loosely formatted JSON values into UTC epoch milliseconds.
//!
//! Accepted forms:
//! - RFC 3339 (`2025-01-15T10:00:00Z`, `2025-01-15T10:00:00+02:00`)
//! - naive date-time (`2025-01-15T10:00:00`, `2025-01-15 10:00`), read as UTC
//! - plain date (`2025-01-15`), read as UTC midnight
//! - any string with a `YYYY-MM-DD` prefix, read as that date
//! - integers, read as epoch milliseconds

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

const NAIVE_DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Whether `s` starts with `YYYY-MM-DD`.
#[must_use]
pub fn has_iso_date_prefix(s: &str) -> bool {
    let b = s.as_bytes();
    if b.len() < 10 {
        return false;
    }
    let digits = |range: std::ops::Range<usize>| b[range].iter().all(u8::is_ascii_digit);
    digits(0..4) && b[4] == b'-' && digits(5..7) && b[7] == b'-' && digits(8..10)
}

/// Parse a date string into epoch milliseconds.
#[must_use]
pub fn parse_millis(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    for fmt in NAIVE_DATE_TIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc().timestamp_millis());
        }
    }
    if has_iso_date_prefix(s) {
        // Safe slice: the prefix check guarantees ten ASCII bytes.
        return NaiveDate::parse_from_str(&s[..10], DATE_FORMAT)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc().timestamp_millis());
    }
    None
}

/// Coerce a JSON value into epoch milliseconds.
#[must_use]
pub fn value_millis(value: &Value) -> Option<i64> {
    match value {
        Value::String(s) => parse_millis(s),
        Value::Number(n) => n.as_i64(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn iso_prefix_detection() {
        assert!(has_iso_date_prefix("2025-01-15"));
        assert!(has_iso_date_prefix("2025-01-15T10:00:00Z"));
        assert!(!has_iso_date_prefix("2025-1-15"));
        assert!(!has_iso_date_prefix("Q1 2025"));
        assert!(!has_iso_date_prefix(""));
    }

    #[test]
    fn plain_date_is_utc_midnight() {
        assert_eq!(parse_millis("1970-01-02"), Some(86_400_000));
    }

    #[test]
    fn rfc3339_with_offset() {
        assert_eq!(parse_millis("1970-01-01T01:00:00+01:00"), Some(0));
    }

    #[test]
    fn naive_date_time_is_utc() {
        assert_eq!(parse_millis("1970-01-01T00:00:01"), Some(1000));
        assert_eq!(parse_millis("1970-01-01 00:01"), Some(60_000));
    }

    #[test]
    fn prefixed_free_text_uses_the_date() {
        assert_eq!(parse_millis("1970-01-02 (fiscal close)"), Some(86_400_000));
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(parse_millis("last quarter"), None);
        assert_eq!(parse_millis("2025-13-45"), None);
    }

    #[test]
    fn value_coercion() {
        assert_eq!(value_millis(&json!(1234)), Some(1234));
        assert_eq!(value_millis(&json!("1970-01-01")), Some(0));
        assert_eq!(value_millis(&json!(true)), None);
        assert_eq!(value_millis(&json!(1.5)), None);
    }
}
