//! Lenient serde helpers for Bot API payloads.
//!
//! The platform sends ids and timestamps either as strings or as numbers, and omits or nulls
//! fields freely. These helpers accept both and fall back to empty values.

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;

/// String, number, bool or null → `String` (null becomes empty).
pub fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_opt_string(deserializer)?.unwrap_or_default())
}

/// Like [`lenient_string`] but keeps null/absent as `None`.
pub fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

/// Number, numeric string or null → `i64` (null and empty string become 0).
pub fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .ok_or_else(|| de::Error::custom(format!("number out of range: {n}"))),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(0),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("expected integer, got {s:?}"))),
        Some(other) => Err(de::Error::custom(format!("expected integer, got {other}"))),
    }
}

/// Bool or null → `bool` (null becomes false).
pub fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "lenient_string")]
        id: String,
        #[serde(default, deserialize_with = "lenient_opt_string")]
        reply: Option<String>,
        #[serde(default, deserialize_with = "lenient_i64")]
        time: i64,
        #[serde(default, deserialize_with = "lenient_bool")]
        edited: bool,
    }

    #[test]
    fn test_accepts_numbers_and_strings() {
        let s: Sample =
            serde_json::from_value(json!({"id": 42, "reply": "7", "time": "1700000000", "edited": true}))
                .unwrap();
        assert_eq!(s.id, "42");
        assert_eq!(s.reply.as_deref(), Some("7"));
        assert_eq!(s.time, 1_700_000_000);
        assert!(s.edited);
    }

    #[test]
    fn test_nulls_and_absent_fields_default() {
        let s: Sample = serde_json::from_value(json!({"id": null, "time": null, "edited": null})).unwrap();
        assert_eq!(s.id, "");
        assert!(s.reply.is_none());
        assert_eq!(s.time, 0);
        assert!(!s.edited);
    }

    #[test]
    fn test_rejects_non_numeric_time() {
        let err = serde_json::from_value::<Sample>(json!({"time": "yesterday"})).unwrap_err();
        assert!(err.to_string().contains("expected integer"));
    }
}
