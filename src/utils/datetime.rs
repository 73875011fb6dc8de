//! Date and time utility functions
//!
//! Timestamps coming back from the backend are not uniform: `timestamptz` columns
//! arrive as RFC 3339 strings while plain `timestamp` columns have no offset at all.
//! These helpers normalize both to UTC and format them for display.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Standard date format used for display and config defaults
pub const DISPLAY_DATE_FORMAT: &str = "%Y-%m-%d";

/// Format used for chart labels, e.g. "Jan 5"
pub const CHART_LABEL_FORMAT: &str = "%b %-d";

/// Parse a backend timestamp into UTC.
///
/// Accepts RFC 3339 (`2024-01-05T10:00:00+00:00`, `...Z`), naive timestamps
/// (`2024-01-05T10:00:00`, `2024-01-05 10:00:00.123`) which are read as UTC,
/// and bare dates (`2024-01-05`) which become midnight UTC.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    // Postgres renders timestamptz as "2024-01-05 10:00:00+00"
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, DISPLAY_DATE_FORMAT) {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }

    Err(format!("unrecognized timestamp: {value}"))
}

/// Format a timestamp as a short chart label ("Jan 5")
pub fn format_chart_label(dt: &DateTime<Utc>) -> String {
    dt.format(CHART_LABEL_FORMAT).to_string()
}

/// Whether `format` is a strftime pattern chrono can render
pub fn is_valid_format(format: &str) -> bool {
    !format.is_empty() && !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

/// Format a timestamp with a user-supplied strftime pattern.
///
/// Falls back to [`DISPLAY_DATE_FORMAT`] when the pattern is invalid.
pub fn format_with(dt: &DateTime<Utc>, format: &str) -> String {
    if is_valid_format(format) {
        dt.format(format).to_string()
    } else {
        dt.format(DISPLAY_DATE_FORMAT).to_string()
    }
}

/// Milliseconds since the Unix epoch, used to keep uploaded object names unique
pub fn unix_millis(dt: &DateTime<Utc>) -> i64 {
    dt.timestamp_millis()
}

/// Serde helpers for timestamps that may arrive in any of the shapes
/// [`parse_timestamp`] understands.
pub mod flexible {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&dt.to_rfc3339())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }

    /// Optional variant: `null` or a missing field becomes `None`
    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer};

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
        where
            D: Deserializer<'de>,
        {
            match Option::<String>::deserialize(deserializer)? {
                None => Ok(None),
                Some(raw) => super::super::parse_timestamp(&raw)
                    .map(Some)
                    .map_err(serde::de::Error::custom),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_rfc3339_and_postgres_shapes() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 5, 10, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-01-05T10:00:00Z").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-01-05T12:00:00+02:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-01-05 10:00:00+00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-01-05T10:00:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-01-05 10:00:00.000").unwrap(), expected);
    }

    #[test]
    fn bare_date_is_midnight_utc() {
        let dt = parse_timestamp("2024-03-09").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 3, 9, 0, 0, 0).unwrap());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_timestamp("next tuesday").is_err());
    }

    #[test]
    fn invalid_format_falls_back() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 5, 8, 30, 0).unwrap();
        assert!(!is_valid_format("%Q"));
        assert_eq!(format_with(&dt, "%Q"), "2024-01-05");
        assert_eq!(format_with(&dt, "%d/%m/%Y"), "05/01/2024");
    }

    #[test]
    fn chart_label_has_no_zero_padding() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 5, 8, 30, 0).unwrap();
        assert_eq!(format_chart_label(&dt), "Jan 5");
    }
}
