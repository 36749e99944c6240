//! Lenient field codecs for backend payloads. The backend is loosely typed:
//! timestamps arrive either as RFC 3339 strings or epoch milliseconds, and
//! money sometimes arrives as a numeric string. Any field may also come
//! back as an explicit `null`.

use chrono::{DateTime, TimeZone, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serializer};

/// Reads `null` as the type's default. Pair with `#[serde(default)]` so a
/// missing key behaves the same way.
pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    Float(f64),
    Text(String),
}

fn from_raw<E: de::Error>(raw: RawTimestamp) -> Result<Option<DateTime<Utc>>, E> {
    match raw {
        RawTimestamp::Millis(ms) => Ok(Utc.timestamp_millis_opt(ms).single()),
        RawTimestamp::Float(ms) => Ok(Utc.timestamp_millis_opt(ms as i64).single()),
        RawTimestamp::Text(text) if text.trim().is_empty() => Ok(None),
        RawTimestamp::Text(text) => DateTime::parse_from_rfc3339(text.trim())
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|err| E::custom(format!("invalid timestamp {text:?}: {err}"))),
    }
}

pub mod timestamp {
    use super::*;

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_str(&dt.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<RawTimestamp>::deserialize(deserializer)? {
            Some(raw) => from_raw(raw),
            None => Ok(None),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Number(f64),
    Text(String),
}

pub mod amount {
    use super::*;

    pub fn serialize<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(*value)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<RawAmount>::deserialize(deserializer)? {
            Some(RawAmount::Number(n)) => Ok(n),
            Some(RawAmount::Text(text)) if text.trim().is_empty() => Ok(0.0),
            Some(RawAmount::Text(text)) => text
                .trim()
                .parse::<f64>()
                .map_err(|err| de::Error::custom(format!("invalid amount {text:?}: {err}"))),
            None => Ok(0.0),
        }
    }
}

/// Optional money field: number, numeric string, empty string or `null`.
pub mod optional_amount {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<RawAmount>::deserialize(deserializer)? {
            Some(RawAmount::Number(n)) => Ok(Some(n)),
            Some(RawAmount::Text(text)) if text.trim().is_empty() => Ok(None),
            Some(RawAmount::Text(text)) => text
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|err| de::Error::custom(format!("invalid amount {text:?}: {err}"))),
            None => Ok(None),
        }
    }
}

/// Display text the backend sends either as a string or as a bare number.
pub mod optional_text {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<RawAmount>::deserialize(deserializer)? {
            Some(RawAmount::Number(n)) => Some(n.to_string()),
            Some(RawAmount::Text(text)) => Some(text),
            None => None,
        })
    }
}
