use serde::{Deserialize, Deserializer};
use serde_json::Value;

// The remote store sends `null` for empty collections and flags on older rows.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub fn status_or_pending<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s,
        Some(Value::Null) | None => "PENDING".to_string(),
        Some(other) => other.to_string(),
    })
}

/// Accepts `"42"` as well as `42` for identifiers that some rows store as numbers.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

pub fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        _ => Ok(None),
    }
}

/// Dates and timestamps are kept as raw wire strings; anything that is not a
/// string is dropped rather than failing the whole payload.
pub fn opt_lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Ok(Some(s)),
        _ => Ok(None),
    }
}

/// Distinguishes a missing field (`None`) from an explicit `null` (`Some(None)`).
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Row {
        #[serde(default, deserialize_with = "null_as_default")]
        flags: Vec<String>,
        #[serde(default = "pending", deserialize_with = "status_or_pending")]
        status: String,
        #[serde(default, deserialize_with = "opt_string_or_number")]
        tester: Option<String>,
        #[serde(default, deserialize_with = "double_option")]
        remark: Option<Option<String>>,
    }

    fn pending() -> String {
        "PENDING".to_string()
    }

    #[test]
    fn lenient_fields() {
        let row: Row = serde_json::from_value(json!({
            "flags": null,
            "status": null,
            "tester": 7,
            "remark": null
        }))
        .unwrap();
        assert!(row.flags.is_empty());
        assert_eq!(row.status, "PENDING");
        assert_eq!(row.tester, Some("7".to_string()));
        assert_eq!(row.remark, Some(None));
    }

    #[test]
    fn missing_fields() {
        let row: Row = serde_json::from_value(json!({})).unwrap();
        assert_eq!(row.status, "PENDING");
        assert_eq!(row.tester, None);
        assert_eq!(row.remark, None);
    }
}
