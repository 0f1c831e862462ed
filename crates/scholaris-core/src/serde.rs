//! Deserialization helpers for filters that arrive through query strings,
//! where an omitted value is often sent as an empty string.

use serde::{Deserialize, Deserializer};
use uuid::Uuid;

pub fn deserialize_optional_uuid<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt.as_deref().map(str::trim) {
        Some("") | None => Ok(None),
        Some(s) => Uuid::parse_str(s)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

pub fn deserialize_optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Filter {
        #[serde(default, deserialize_with = "deserialize_optional_uuid")]
        school_id: Option<Uuid>,
        #[serde(default, deserialize_with = "deserialize_optional_text")]
        name: Option<String>,
    }

    #[test]
    fn test_empty_values_are_none() {
        let f: Filter = serde_json::from_str(r#"{"school_id":"","name":"   "}"#).unwrap();
        assert!(f.school_id.is_none());
        assert!(f.name.is_none());
    }

    #[test]
    fn test_values_parse() {
        let id = Uuid::new_v4();
        let f: Filter =
            serde_json::from_str(&format!(r#"{{"school_id":"{}","name":" North "}}"#, id)).unwrap();
        assert_eq!(f.school_id, Some(id));
        assert_eq!(f.name.as_deref(), Some("North"));
    }

    #[test]
    fn test_invalid_uuid_errors() {
        assert!(serde_json::from_str::<Filter>(r#"{"school_id":"nope"}"#).is_err());
    }
}
