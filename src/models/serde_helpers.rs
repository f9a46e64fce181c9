//! Lenient (de)serialization helpers
//!
//! Records reach this crate from three places: the hosted backend, the static
//! snapshot file written by the WordPress import tooling, and the local store.
//! They do not agree on formats, so the helpers here accept every shape seen in
//! practice and always write back one canonical form.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{de, Deserialize, Deserializer, Serializer};

/// Parse a timestamp in any of the accepted formats.
///
/// Accepted:
/// - RFC 3339 (`2024-03-05T10:00:00Z`, `2024-03-05T10:00:00+00:00`)
/// - naive date-time, read as UTC (`2024-03-05T10:00:00`, `2024-03-05 10:00:00.123`)
/// - bare date, read as midnight UTC (`2024-03-05`)
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Canonical textual form of a timestamp
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// `#[serde(with = "timestamp")]` for required timestamps
pub mod timestamp {
    use super::*;

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_timestamp(dt))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid timestamp: {}", raw)))
    }

    /// `#[serde(with = "timestamp::option")]` for nullable timestamps
    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            dt: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match dt {
                Some(dt) => serializer.serialize_some(&format_timestamp(dt)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                None => Ok(None),
                Some(raw) if raw.trim().is_empty() => Ok(None),
                Some(raw) => parse_timestamp(&raw)
                    .map(Some)
                    .ok_or_else(|| de::Error::custom(format!("invalid timestamp: {}", raw))),
            }
        }
    }

    /// `#[serde(default, with = "timestamp::nullable")]` for partial updates
    pub mod nullable {
        use super::*;

        pub fn serialize<S: Serializer>(
            dt: &Option<Option<DateTime<Utc>>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match dt {
                Some(Some(dt)) => serializer.serialize_some(&format_timestamp(dt)),
                _ => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Option<DateTime<Utc>>>, D::Error> {
            super::option::deserialize(deserializer).map(Some)
        }
    }
}

/// Partial-update fields where an explicit `null` differs from a missing key.
///
/// Used with `#[serde(default)]`: a missing key stays `None`, `null` becomes
/// `Some(None)` and a value becomes `Some(Some(value))`.
pub mod nullable {
    use super::*;

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

/// Identifiers that may arrive as JSON strings or numbers.
///
/// WordPress ids are numeric, hosted rows may use integer keys, while ids
/// minted by this crate are strings.
pub mod lenient_id {
    use super::*;
    use serde_json::Value;

    fn from_value<E: de::Error>(value: Value) -> Result<Option<String>, E> {
        match value {
            Value::Null => Ok(None),
            Value::String(s) if s.trim().is_empty() => Ok(None),
            Value::String(s) => Ok(Some(s)),
            Value::Number(n) => Ok(Some(n.to_string())),
            other => Err(E::custom(format!("expected string or number id, got {}", other))),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        from_value(Value::deserialize(deserializer)?)?
            .ok_or_else(|| de::Error::custom("missing id"))
    }

    /// Nullable variant
    pub mod option {
        use super::*;

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<String>, D::Error> {
            from_value(Value::deserialize(deserializer)?)
        }
    }

    /// Partial-update variant, see [`super::nullable`]
    pub mod nullable {
        use super::*;

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Option<String>>, D::Error> {
            from_value(Value::deserialize(deserializer)?).map(Some)
        }
    }
}
