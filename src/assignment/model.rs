use crate::models::{double_option, null_as_default, opt_lenient_string, opt_string_or_number, status_or_pending};
use bon::Builder;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Named boolean checks recorded on the checklist step.
pub type SubChecks = BTreeMap<String, bool>;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Builder)]
pub struct Assignment {
    pub id: i64,
    pub unit_id: String,
    pub step_id: i64,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub tester_id: Option<String>,
    #[serde(default, deserialize_with = "opt_lenient_string")]
    pub start_at: Option<String>,
    #[serde(default, deserialize_with = "opt_lenient_string")]
    pub end_at: Option<String>,
    #[serde(default = "pending", deserialize_with = "status_or_pending")]
    #[builder(default = pending())]
    pub status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    #[builder(default)]
    pub skipped: bool,
    #[serde(default)]
    pub remark: Option<String>,
    #[serde(default, deserialize_with = "lenient_sub_checks")]
    pub sub_checks: Option<SubChecks>,
}

fn pending() -> String {
    "PENDING".to_string()
}

// Non-boolean entries are dropped instead of failing the whole assignment.
fn lenient_sub_checks<'de, D>(deserializer: D) -> Result<Option<SubChecks>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Object(map)) => Ok(Some(
            map.into_iter()
                .filter_map(|(name, value)| value.as_bool().map(|checked| (name, checked)))
                .collect(),
        )),
        _ => Ok(None),
    }
}

/// Partial update of an assignment. Absent fields are left alone; for the
/// nullable fields `Some(None)` clears the value on the server.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct AssignmentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub tester_id: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub start_at: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub end_at: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skipped: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub remark: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_checks: Option<SubChecks>,
}

impl AssignmentPatch {
    pub fn is_empty(&self) -> bool {
        self == &AssignmentPatch::default()
    }

    /// Fields set on `other` win.
    pub fn merge(&mut self, other: AssignmentPatch) {
        if other.tester_id.is_some() {
            self.tester_id = other.tester_id;
        }
        if other.start_at.is_some() {
            self.start_at = other.start_at;
        }
        if other.end_at.is_some() {
            self.end_at = other.end_at;
        }
        if other.status.is_some() {
            self.status = other.status;
        }
        if other.skipped.is_some() {
            self.skipped = other.skipped;
        }
        if other.remark.is_some() {
            self.remark = other.remark;
        }
        if other.sub_checks.is_some() {
            self.sub_checks = other.sub_checks;
        }
    }

    pub fn apply_to(&self, assignment: &mut Assignment) {
        if let Some(tester_id) = &self.tester_id {
            assignment.tester_id = tester_id.clone();
        }
        if let Some(start_at) = &self.start_at {
            assignment.start_at = start_at.clone();
        }
        if let Some(end_at) = &self.end_at {
            assignment.end_at = end_at.clone();
        }
        if let Some(status) = &self.status {
            assignment.status = status.clone();
        }
        if let Some(skipped) = self.skipped {
            assignment.skipped = skipped;
        }
        if let Some(remark) = &self.remark {
            assignment.remark = remark.clone();
        }
        if let Some(sub_checks) = &self.sub_checks {
            assignment.sub_checks = Some(sub_checks.clone());
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct AssignmentFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tester_id: Option<String>,
}

impl AssignmentFilter {
    pub fn all() -> Self {
        AssignmentFilter::default()
    }

    pub fn for_tester(tester_id: &str) -> Self {
        AssignmentFilter {
            unit_id: None,
            tester_id: Some(tester_id.to_string()),
        }
    }
}
