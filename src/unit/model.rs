use crate::assignment::model::Assignment;
use crate::models::{null_as_default, status_or_pending};
use crate::result::model::TestResult;
use bon::Builder;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Builder)]
pub struct UnitSummary {
    pub id: String,
    #[serde(default = "pending", deserialize_with = "status_or_pending")]
    #[builder(default = pending())]
    pub status: String,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub lot: Option<String>,
}

fn pending() -> String {
    "PENDING".to_string()
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct UnitDetails {
    pub unit: UnitSummary,
    #[serde(default, deserialize_with = "null_as_default")]
    pub assignments: Vec<Assignment>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<TestResult>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Builder)]
pub struct CreateUnitRequest {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lot: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RenameUnitRequest {
    pub new_id: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Builder)]
pub struct DuplicateScheduleRequest {
    pub new_unit_ids: Vec<String>,
    #[serde(default)]
    #[builder(default)]
    pub day_offset: i64,
}
