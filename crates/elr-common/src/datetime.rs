//! Lenient date and date-time parsing.
//!
//! Submissions arrive with RFC 3339 stamps, HL7 `DTM` values, plain ISO
//! dates and US-style dates. Values without an offset are read as UTC.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};

/// HL7 `DTM` layout used when rendering date-times.
pub const DATETIME_PATTERN: &str = "%Y%m%d%H%M%S%z";
/// HL7 `DT` layout used when rendering dates.
pub const DATE_PATTERN: &str = "%Y%m%d";

const OFFSET_PATTERNS: &[&str] = &[
    "%Y%m%d%H%M%S%.f%z",
    "%Y%m%d%H%M%S%z",
    "%Y%m%d%H%M%z",
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
];

const NAIVE_PATTERNS: &[&str] = &[
    "%Y%m%d%H%M%S%.f",
    "%Y%m%d%H%M%S",
    "%Y%m%d%H%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_PATTERNS: &[&str] = &["%Y%m%d", "%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

/// Parses a date-time in any supported layout.
///
/// # Examples
///
/// ```
/// use elr_common::parse_datetime;
///
/// assert!(parse_datetime("2024-01-15T09:30:00Z").is_some());
/// assert!(parse_datetime("20240115093000-0500").is_some());
/// assert!(parse_datetime("2024-01-15").is_some());
/// assert!(parse_datetime("last tuesday").is_none());
/// ```
pub fn parse_datetime(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed);
    }
    for pattern in OFFSET_PATTERNS {
        if let Ok(parsed) = DateTime::parse_from_str(value, pattern) {
            return Some(parsed);
        }
    }
    for pattern in NAIVE_PATTERNS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, pattern) {
            return Some(parsed.and_utc().fixed_offset());
        }
    }
    parse_date_only(value)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|start| start.and_utc().fixed_offset())
}

/// Parses a calendar date, also accepting a date-time and keeping its date.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    parse_date_only(value).or_else(|| parse_datetime(value).map(|parsed| parsed.date_naive()))
}

fn parse_date_only(value: &str) -> Option<NaiveDate> {
    DATE_PATTERNS
        .iter()
        .find_map(|pattern| NaiveDate::parse_from_str(value, pattern).ok())
}

/// Renders a date-time as an HL7 `DTM` value.
pub fn format_datetime(value: &DateTime<FixedOffset>) -> String {
    value.format(DATETIME_PATTERN).to_string()
}

/// Renders a date as an HL7 `DT` value.
pub fn format_date(value: NaiveDate) -> String {
    value.format(DATE_PATTERN).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn hl7_offsets_are_kept() {
        let parsed = parse_datetime("20240115093000-0500").unwrap();
        assert_eq!(parsed.hour(), 9);
        assert_eq!(parsed.offset().local_minus_utc(), -5 * 3600);
    }

    #[test]
    fn naive_values_are_utc() {
        let parsed = parse_datetime("2024-01-15 09:30:00").unwrap();
        assert_eq!(parsed.offset().local_minus_utc(), 0);
        assert_eq!(parsed.minute(), 30);
    }

    #[test]
    fn date_only_values_start_at_midnight() {
        let parsed = parse_datetime("01/15/2024").unwrap();
        assert_eq!((parsed.year(), parsed.month(), parsed.day()), (2024, 1, 15));
        assert_eq!(parsed.hour(), 0);
    }

    #[test]
    fn date_from_datetime() {
        let date = parse_date("2024-01-15T23:10:00+02:00").unwrap();
        assert_eq!(format_date(date), "20240115");
    }

    #[test]
    fn unparsable_values() {
        assert_eq!(parse_datetime(""), None);
        assert_eq!(parse_datetime("2024-13-45"), None);
        assert_eq!(parse_date("soon"), None);
    }
}
