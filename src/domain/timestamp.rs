//! Serde adapter for backend timestamps.
//!
//! The API emits ISO-8601 strings, sometimes with an offset (`...Z`) and
//! sometimes naive (`2024-05-01T12:00:00.123456`). Naive values are UTC.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serializer};

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let raw = raw.trim();
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Ok(with_offset.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
}

pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_rfc3339())
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_naive_and_offset_forms() {
        let naive = parse_timestamp("2024-05-01T12:30:00.123456").unwrap();
        assert_eq!((naive.year(), naive.hour(), naive.minute()), (2024, 12, 30));

        let zulu = parse_timestamp("2024-05-01T12:30:00Z").unwrap();
        assert_eq!(zulu.hour(), 12);

        let offset = parse_timestamp("2024-05-01T14:30:00+02:00").unwrap();
        assert_eq!(offset.hour(), 12);

        let spaced = parse_timestamp("2024-05-01 12:30:00").unwrap();
        assert_eq!(spaced.minute(), 30);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_timestamp("yesterday").is_err());
    }
}
