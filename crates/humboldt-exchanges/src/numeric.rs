//! Serde helpers for string-encoded ticker numerics.
//!
//! The exchange APIs encode prices and volumes as JSON strings
//! (`"last": "68123.45"`); these helpers accept either form.

use serde::{Deserialize, Deserializer, de};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    String(String),
}

/// Deserializes an `f64` from either a JSON number or a numeric string.
pub(crate) fn string_as_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("invalid numeric string '{s}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Wrapper {
        #[serde(deserialize_with = "string_as_f64")]
        value: f64,
    }

    #[test]
    fn test_accepts_string() {
        let w: Wrapper = serde_json::from_str(r#"{"value": "123.45"}"#).unwrap();
        assert!((w.value - 123.45).abs() < 1e-10);
    }

    #[test]
    fn test_accepts_number() {
        let w: Wrapper = serde_json::from_str(r#"{"value": 123.45}"#).unwrap();
        assert!((w.value - 123.45).abs() < 1e-10);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(serde_json::from_str::<Wrapper>(r#"{"value": "abc"}"#).is_err());
    }
}
