//! Date parsing for `<lastmod>`, `<news:publication_date>`, RSS and Atom.
//!
//! Sitemaps use W3C Datetime (a profile of ISO 8601) with every precision
//! from a bare year down to fractional seconds. RSS uses RFC 2822. Values
//! without an offset are taken as UTC.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

const OFFSET_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M%:z", "%Y-%m-%dT%H:%M%z", "%Y-%m-%d %H:%M:%S%:z"];

/// Parse any date format found in sitemaps and feeds.
pub fn parse_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt);
    }

    let zulu = match value.strip_suffix('Z').or_else(|| value.strip_suffix('z')) {
        Some(rest) => format!("{rest}+00:00"),
        None => value.to_string(),
    };
    for format in OFFSET_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&zulu, format) {
            return Some(dt);
        }
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(utc(naive));
        }
    }

    if let Some(date) = parse_partial_date(value) {
        return date.and_hms_opt(0, 0, 0).map(utc);
    }

    DateTime::parse_from_rfc2822(value).ok()
}

/// `YYYY-MM-DD`, `YYYY-MM` or `YYYY`.
fn parse_partial_date(value: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    let mut parts = value.splitn(3, '-');
    let year = parts.next()?;
    if year.len() != 4 {
        return None;
    }
    let year: i32 = year.parse().ok()?;
    match (parts.next(), parts.next()) {
        (None, None) => NaiveDate::from_ymd_opt(year, 1, 1),
        (Some(month), None) if month.len() == 2 => NaiveDate::from_ymd_opt(year, month.parse().ok()?, 1),
        _ => None,
    }
}

fn utc(naive: NaiveDateTime) -> DateTime<FixedOffset> {
    Utc.from_utc_datetime(&naive).fixed_offset()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iso(raw: &str) -> String {
        parse_date(raw).unwrap().to_rfc3339()
    }

    #[test]
    fn test_full_rfc3339() {
        assert_eq!(iso("2024-03-01T12:30:45+02:00"), "2024-03-01T12:30:45+02:00");
        assert_eq!(iso("2024-03-01T12:30:45.123Z"), "2024-03-01T12:30:45.123+00:00");
    }

    #[test]
    fn test_minutes_precision_with_offset() {
        assert_eq!(iso("2024-03-01T12:30+01:00"), "2024-03-01T12:30:00+01:00");
        assert_eq!(iso("2024-03-01T12:30Z"), "2024-03-01T12:30:00+00:00");
    }

    #[test]
    fn test_naive_values_are_utc() {
        assert_eq!(iso("2024-03-01T12:30:45"), "2024-03-01T12:30:45+00:00");
        assert_eq!(iso("2024-03-01 08:00:00"), "2024-03-01T08:00:00+00:00");
    }

    #[test]
    fn test_partial_dates() {
        assert_eq!(iso("2024-03-01"), "2024-03-01T00:00:00+00:00");
        assert_eq!(iso("2024-03"), "2024-03-01T00:00:00+00:00");
        assert_eq!(iso("2024"), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_rfc2822() {
        assert_eq!(iso("Tue, 05 Mar 2024 10:00:00 +0000"), "2024-03-05T10:00:00+00:00");
        assert_eq!(iso("Tue, 05 Mar 2024 10:00:00 GMT"), "2024-03-05T10:00:00+00:00");
    }

    #[test]
    fn test_garbage() {
        assert!(parse_date("").is_none());
        assert!(parse_date("yesterday").is_none());
        assert!(parse_date("2024-13-45").is_none());
        assert!(parse_date("24").is_none());
    }
}
