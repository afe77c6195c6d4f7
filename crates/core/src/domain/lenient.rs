//! Forgiving field decoders for catalogue records.
//!
//! Records reach the store from seed files, older JSON documents and admin
//! edits. A field that is missing or cannot be read decodes to its lowest
//! value (zero, the UNIX epoch, no markers) instead of rejecting the record.

use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::domain::product::Marker;

pub fn price<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(decimal_from_value).unwrap_or(Decimal::ZERO).max(Decimal::ZERO))
}

pub fn rating<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(clamp_rating(value.as_ref().and_then(f64_from_value).unwrap_or(0.0)))
}

pub fn count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(f64_from_value)
        .filter(|number| *number > 0.0)
        .map(|number| number.trunc() as u64)
        .unwrap_or(0))
}

pub fn count_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    count(deserializer).map(|number| u32::try_from(number).unwrap_or(u32::MAX))
}

pub fn timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(timestamp_from_value).unwrap_or(DateTime::<Utc>::UNIX_EPOCH))
}

/// Accepts `["crueltyFree", ...]` or `{"crueltyFree": true, ...}`.
pub fn markers<'de, D>(deserializer: D) -> Result<BTreeSet<Marker>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let markers = match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .filter_map(|name| Marker::from_str(name).ok())
            .collect(),
        Some(Value::Object(flags)) => flags
            .iter()
            .filter(|(_, flag)| flag.as_bool().unwrap_or(false))
            .filter_map(|(name, _)| Marker::from_str(name).ok())
            .collect(),
        _ => BTreeSet::new(),
    };
    Ok(markers)
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

pub fn clamp_rating(rating: f64) -> f64 {
    if rating.is_finite() {
        rating.clamp(0.0, 5.0)
    } else {
        0.0
    }
}

fn decimal_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(number) => {
            let text = number.to_string();
            Decimal::from_str(&text).or_else(|_| Decimal::from_scientific(&text)).ok()
        }
        Value::String(text) => Decimal::from_str(text.trim()).ok(),
        _ => None,
    }
}

fn f64_from_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

fn timestamp_from_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(text) => parse_timestamp(text),
        Value::Number(number) => {
            number.as_i64().and_then(DateTime::<Utc>::from_timestamp_millis)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use rust_decimal::Decimal;

    use super::parse_timestamp;
    use crate::domain::product::{Marker, Product};

    fn decode(json: &str) -> Product {
        serde_json::from_str(json).expect("product decodes")
    }

    #[test]
    fn malformed_numbers_decode_as_zero() {
        let product = decode(
            r#"{"id":"p1","name":"Soap","price":"n/a","rating":null,"reviews":"many","popularity":-4}"#,
        );

        assert_eq!(product.price, Decimal::ZERO);
        assert_eq!(product.rating, 0.0);
        assert_eq!(product.reviews, 0);
        assert_eq!(product.popularity, 0);
    }

    #[test]
    fn missing_or_invalid_dates_decode_as_epoch() {
        let missing = decode(r#"{"id":"p1","name":"Soap"}"#);
        let invalid = decode(r#"{"id":"p2","name":"Soap","createdAt":"yesterday"}"#);

        assert_eq!(missing.created_at, DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(invalid.created_at, DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn numeric_prices_and_plain_dates_are_read() {
        let product = decode(
            r#"{"id":"p1","name":"Soap","price":18.5,"rating":9,"createdAt":"2024-03-01"}"#,
        );

        assert_eq!(product.price, Decimal::new(185, 1));
        assert_eq!(product.rating, 5.0);
        assert_eq!(product.created_at, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn markers_accept_list_or_flag_object() {
        let listed = decode(
            r#"{"id":"p1","name":"Soap","markers":["crueltyFree","glitter","recyclable"]}"#,
        );
        let flagged = decode(
            r#"{"id":"p2","name":"Soap","markers":{"organicIngredients":true,"recyclable":false}}"#,
        );

        assert_eq!(
            listed.markers.into_iter().collect::<Vec<_>>(),
            vec![Marker::Recyclable, Marker::CrueltyFree]
        );
        assert_eq!(flagged.markers.into_iter().collect::<Vec<_>>(), vec![Marker::OrganicIngredients]);
    }

    #[test]
    fn rfc3339_timestamps_normalize_to_utc() {
        let parsed = parse_timestamp("2024-05-01T12:00:00+02:00").expect("parses");
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap());
    }
}
