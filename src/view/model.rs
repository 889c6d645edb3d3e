use crate::assignment::model::{Assignment, SubChecks};
use crate::result::model::TestResult;
use crate::status::model::CellStatus;
use crate::step::model::Step;
use crate::unit::model::UnitSummary;
use serde::Serialize;

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct StepColumn {
    pub id: i64,
    pub name: String,
    pub order: i64,
    pub required: bool,
}

impl From<&Step> for StepColumn {
    fn from(step: &Step) -> Self {
        StepColumn {
            id: step.id,
            name: step.name.clone(),
            order: step.order,
            required: step.required,
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct MatrixCell {
    pub step_id: i64,
    #[serde(flatten)]
    pub status: CellStatus,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct MatrixRow {
    pub unit_id: String,
    pub unit_status: String,
    pub progress: Option<u8>,
    pub cells: Vec<MatrixCell>,
    pub error: Option<String>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct MatrixView {
    pub today: String,
    pub steps: Vec<StepColumn>,
    pub rows: Vec<MatrixRow>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct QueueItem {
    pub assignment_id: i64,
    pub unit_id: String,
    pub step_id: i64,
    pub step_name: String,
    pub step_order: i64,
    pub tester_id: Option<String>,
    pub start_at: Option<String>,
    pub end_at: Option<String>,
    pub remark: Option<String>,
    pub sub_checks: Option<SubChecks>,
    pub checklist: bool,
    pub status: CellStatus,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct UnitStepCell {
    pub step_id: i64,
    pub step_name: String,
    pub order: i64,
    pub required: bool,
    pub checklist: bool,
    pub assignment: Option<Assignment>,
    pub result: Option<TestResult>,
    pub status: CellStatus,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct UnitView {
    pub unit: UnitSummary,
    pub progress: u8,
    pub cells: Vec<UnitStepCell>,
}
