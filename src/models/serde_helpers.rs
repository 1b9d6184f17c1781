//! Lenient field codecs for backend payloads
//!
//! The backend serializes decimals as strings ("1500.00") and mixes plain
//! dates with full timestamps. Both shapes are accepted on input; output is
//! always a JSON number / `YYYY-MM-DD`.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value;

/// Parse `YYYY-MM-DD`, an RFC 3339 timestamp, or anything starting with a date
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            raw.get(..10)
                .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
        })
}

pub mod opt_date {
    use super::*;
    use serde::de::Error as _;

    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => s.serialize_str(&d.format("%Y-%m-%d").to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        match Option::<String>::deserialize(d)? {
            None => Ok(None),
            Some(s) if s.trim().is_empty() => Ok(None),
            Some(s) => parse_date(&s)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid date: {}", s))),
        }
    }
}

pub mod opt_number {
    use super::*;
    use serde::de::Error as _;

    pub fn serialize<S: Serializer>(value: &Option<f64>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => s.serialize_f64(*v),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        match Value::deserialize(d)? {
            Value::Null => Ok(None),
            Value::Number(n) => Ok(n.as_f64()),
            Value::String(s) if s.trim().is_empty() => Ok(None),
            Value::String(s) => s
                .trim()
                .replace(',', "")
                .parse::<f64>()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("invalid number: {}", s))),
            other => Err(D::Error::custom(format!("expected number, got {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
    #[serde(default)]
    struct Sample {
        #[serde(with = "opt_date")]
        date: Option<NaiveDate>,
        #[serde(with = "opt_number")]
        price: Option<f64>,
    }

    #[test]
    fn dates_accept_plain_and_timestamp_forms() {
        assert_eq!(parse_date("2024-03-01"), NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(
            parse_date("2024-03-01T10:00:00+04:00"),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
        assert_eq!(
            parse_date("2024-03-01T10:00:00.000000Z"),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
        assert_eq!(parse_date("01/03/2024"), None);
    }

    #[test]
    fn numbers_accept_strings() {
        let sample: Sample = serde_json::from_value(json!({"price": "1,500.50"})).unwrap();
        assert_eq!(sample.price, Some(1500.5));
        let sample: Sample = serde_json::from_value(json!({"price": 99})).unwrap();
        assert_eq!(sample.price, Some(99.0));
    }

    #[test]
    fn missing_and_blank_fields_are_none() {
        let sample: Sample = serde_json::from_value(json!({"date": "", "price": ""})).unwrap();
        assert_eq!(sample, Sample::default());
        let sample: Sample = serde_json::from_value(json!({})).unwrap();
        assert_eq!(sample, Sample::default());
    }

    #[test]
    fn output_is_normalized() {
        let sample = Sample {
            date: NaiveDate::from_ymd_opt(2025, 1, 31),
            price: Some(10.0),
        };
        let value = serde_json::to_value(&sample).unwrap();
        assert_eq!(value, json!({"date": "2025-01-31", "price": 10.0}));
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(serde_json::from_value::<Sample>(json!({"date": "soon"})).is_err());
        assert!(serde_json::from_value::<Sample>(json!({"price": "cheap"})).is_err());
    }
}
