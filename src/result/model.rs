use crate::models::{null_as_default, opt_lenient_string};
use bon::Builder;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Builder)]
pub struct TestResult {
    pub id: i64,
    pub unit_id: String,
    pub step_id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    #[builder(default)]
    pub passed: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    #[builder(default)]
    pub metrics: Map<String, Value>,
    #[serde(default, deserialize_with = "lenient_files")]
    #[builder(default)]
    pub files: Vec<String>,
    #[serde(default, deserialize_with = "opt_lenient_string")]
    pub finished_at: Option<String>,
}

// Older rows store file objects instead of names; entries without a name are dropped.
fn lenient_files<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(Value::Array(entries)) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(vec![]);
    };
    Ok(entries
        .into_iter()
        .filter_map(|entry| match entry {
            Value::String(name) => Some(name),
            Value::Object(map) => ["name", "file_name", "path", "url"]
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_str))
                .map(str::to_string),
            _ => None,
        })
        .collect())
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Builder)]
pub struct CreateResultRequest {
    pub unit_id: String,
    pub step_id: i64,
    pub passed: bool,
    #[serde(default)]
    #[builder(default)]
    pub metrics: Map<String, Value>,
    /// Left out so the server stamps the current time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,
}

/// "The" result of each step: later entries in the server's list win.
pub fn latest_by_step(results: &[TestResult]) -> HashMap<i64, &TestResult> {
    let mut latest = HashMap::new();
    for result in results {
        latest.insert(result.step_id, result);
    }
    latest
}
