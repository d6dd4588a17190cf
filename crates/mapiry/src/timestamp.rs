//! Lenient timestamp parsing for response fields.
//!
//! Response timestamps are best-effort: anything unparsable becomes `None`
//! instead of failing the whole record.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};

/// Formats tried in order; the first match wins. All are read as UTC.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.fZ",
    "%Y-%m-%dT%H:%M:%SZ",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a textual timestamp into a UTC instant.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if value.is_empty() {
        return None;
    }

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Serde adapter for optional timestamp fields.
///
/// Strings go through [`parse_timestamp`]; integers are Unix epoch
/// milliseconds. Any other JSON value yields `None`.
pub(crate) fn lenient<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => parse_timestamp(&s),
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_fractional_seconds() {
        let ts = parse_timestamp("2021-03-04T05:06:07.123456Z").unwrap();
        assert_eq!(ts.year(), 2021);
        assert_eq!(ts.second(), 7);
        assert_eq!(ts.nanosecond(), 123_456_000);
    }

    #[test]
    fn test_all_accepted_formats() {
        let expected = Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(parse_timestamp("2021-03-04T05:06:07Z"), Some(expected));
        assert_eq!(parse_timestamp("2021-03-04T05:06:07"), Some(expected));
        assert_eq!(parse_timestamp("2021-03-04 05:06:07"), Some(expected));

        let midnight = Utc.with_ymd_and_hms(2021, 3, 4, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2021-03-04"), Some(midnight));
    }

    #[test]
    fn test_unparsable_is_none() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("not a date"), None);
        assert_eq!(parse_timestamp("2021-03-04T05:06:07+09:00"), None);
        assert_eq!(parse_timestamp("2021-02-30"), None);
    }

    #[derive(Deserialize)]
    struct Holder {
        #[serde(default, deserialize_with = "lenient")]
        at: Option<DateTime<Utc>>,
    }

    #[test]
    fn test_lenient_deserialize() {
        let h: Holder = serde_json::from_str(r#"{"at": "2020-01-01"}"#).unwrap();
        assert_eq!(h.at.unwrap().year(), 2020);

        let h: Holder = serde_json::from_str(r#"{"at": 1609459200000}"#).unwrap();
        assert_eq!(h.at, Some(Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap()));

        let h: Holder = serde_json::from_str(r#"{"at": "garbage"}"#).unwrap();
        assert!(h.at.is_none());

        let h: Holder = serde_json::from_str(r#"{"at": null}"#).unwrap();
        assert!(h.at.is_none());

        let h: Holder = serde_json::from_str(r#"{"at": [1, 2]}"#).unwrap();
        assert!(h.at.is_none());

        let h: Holder = serde_json::from_str("{}").unwrap();
        assert!(h.at.is_none());
    }
}
