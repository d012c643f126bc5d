//! Timestamp parsing for `published` and `modified`.
//!
//! Values are read with the configured `date_format` first, then with the
//! plain `YYYY-MM-DD HH:MM:SS` and `YYYY-MM-DD` forms, then as RFC 3339.
//! Timestamps without an offset are taken as UTC.

use crate::types::{Data, scalar_str};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;

const FALLBACK_DATETIME: &str = "%Y-%m-%d %H:%M:%S";
const FALLBACK_DATE: &str = "%Y-%m-%d";

#[derive(Error, Debug, PartialEq)]
pub enum DateError {
    #[error("Cannot parse {field} timestamp '{value}'")]
    Unparseable { field: String, value: String },
}

/// Parse a raw timestamp string.
pub fn parse_timestamp(raw: &str, format: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    for fmt in [format, FALLBACK_DATETIME] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    for fmt in [format, FALLBACK_DATE] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Read a timestamp field from document data.
///
/// Absent and null fields are `Ok(None)`. A present value that does not
/// parse is an error.
pub fn read_field(
    data: &Data,
    field: &str,
    format: &str,
) -> Result<Option<DateTime<Utc>>, DateError> {
    let value = match data.get(field) {
        None | Some(serde_yaml::Value::Null) => return Ok(None),
        Some(value) => value,
    };
    let unparseable = || DateError::Unparseable {
        field: field.to_string(),
        value: describe(value),
    };
    let raw = scalar_str(value).ok_or_else(unparseable)?;
    parse_timestamp(&raw, format).map(Some).ok_or_else(unparseable)
}

/// Render a timestamp the way head tags carry it.
pub fn to_wire(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339()
}

fn describe(value: &serde_yaml::Value) -> String {
    scalar_str(value).unwrap_or_else(|| {
        serde_yaml::to_string(value)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_yaml::Value;

    const FMT: &str = "%Y-%m-%d %H:%M:%S";

    #[test]
    fn parses_configured_format() {
        let ts = parse_timestamp("2020-03-04 05:06:07", FMT).unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2020, 3, 4, 5, 6, 7).unwrap());
    }

    #[test]
    fn parses_plain_date_as_midnight() {
        let ts = parse_timestamp("2020-01-01", FMT).unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn parses_rfc3339_with_offset() {
        let ts = parse_timestamp("2020-01-01T02:00:00+02:00", FMT).unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn parses_custom_format() {
        let ts = parse_timestamp("04/03/2020", "%d/%m/%Y").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2020, 3, 4, 0, 0, 0).unwrap());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_timestamp("next tuesday", FMT).is_none());
        assert!(parse_timestamp("", FMT).is_none());
    }

    #[test]
    fn read_field_absent_is_none() {
        let data = Data::new();
        assert_eq!(read_field(&data, "published", FMT), Ok(None));
    }

    #[test]
    fn read_field_null_is_none() {
        let mut data = Data::new();
        data.insert("published".into(), Value::Null);
        assert_eq!(read_field(&data, "published", FMT), Ok(None));
    }

    #[test]
    fn read_field_unparseable_is_error() {
        let mut data = Data::new();
        data.insert("modified".into(), Value::from("soon"));
        let err = read_field(&data, "modified", FMT).unwrap_err();
        assert_eq!(
            err,
            DateError::Unparseable {
                field: "modified".into(),
                value: "soon".into()
            }
        );
    }

    #[test]
    fn read_field_sequence_is_error() {
        let mut data = Data::new();
        data.insert("published".into(), Value::Sequence(vec![]));
        assert!(read_field(&data, "published", FMT).is_err());
    }

    #[test]
    fn wire_format_is_rfc3339() {
        let ts = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(to_wire(&ts), "2020-01-01T00:00:00+00:00");
    }
}
