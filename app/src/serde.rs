use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, de::Error as _};

/// Form inputs and query strings deliver numbers as text; JSON clients send numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StringOrNumber<T> {
    String(String),
    Number(T),
}

fn parse_trimmed<T, E>(s: &str) -> Result<T, E>
where
    T: FromStr,
    T::Err: Display,
    E: serde::de::Error,
{
    s.trim()
        .parse::<T>()
        .map_err(|e| E::custom(format!("Failed to parse string: {}", e)))
}

pub fn deserialize_number<'de, T, D>(deserialize: D) -> Result<T, D::Error>
where
    T: FromStr + Deserialize<'de>,
    D: serde::Deserializer<'de>,
    T::Err: Display,
{
    match StringOrNumber::<T>::deserialize(deserialize)? {
        StringOrNumber::String(s) => parse_trimmed(&s),
        StringOrNumber::Number(n) => Ok(n),
    }
}

/// Like [`deserialize_number`], but `null` and blank strings become `None`.
/// Pair with `#[serde(default)]` so a missing field is accepted too.
pub fn deserialize_optional_number<'de, T, D>(deserialize: D) -> Result<Option<T>, D::Error>
where
    T: FromStr + Deserialize<'de>,
    D: serde::Deserializer<'de>,
    T::Err: Display,
{
    match Option::<StringOrNumber<T>>::deserialize(deserialize)? {
        None => Ok(None),
        Some(StringOrNumber::String(s)) if s.trim().is_empty() => Ok(None),
        Some(StringOrNumber::String(s)) => parse_trimmed(&s).map(Some),
        Some(StringOrNumber::Number(n)) => Ok(Some(n)),
    }
}

/// Calendar date given either as `YYYY-MM-DD` or as a full RFC 3339 timestamp,
/// which is what browsers send for date pickers serialized through `Date`.
pub fn deserialize_optional_date<'de, D>(deserialize: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserialize)? else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map(Some)
        .map_err(|e| D::Error::custom(format!("Invalid date {raw:?}: {e}")))
}
