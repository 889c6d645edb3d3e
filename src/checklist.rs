use crate::api::AppError;
use crate::assignment::model::SubChecks;
use crate::result::model::CreateResultRequest;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// The three readings taken on the checklist step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    Ambient,
    Low,
    High,
}

pub const ALL_CHECKS: [Check; 3] = [Check::Ambient, Check::Low, Check::High];

impl Check {
    pub fn name(&self) -> &'static str {
        match self {
            Check::Ambient => "ambient",
            Check::Low => "low",
            Check::High => "high",
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Check {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ambient" => Ok(Check::Ambient),
            "low" => Ok(Check::Low),
            "high" => Ok(Check::High),
            _ => Err(AppError::Validation(format!("Unknown check: {}", s))),
        }
    }
}

/// Outcome of flipping one check.
#[derive(Debug, Clone, PartialEq)]
pub struct ChecklistToggle {
    pub sub_checks: SubChecks,
    pub result: Option<CreateResultRequest>,
}

/// Step that uses the checklist instead of the PASS/FAIL quick action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChecklistRule {
    step_id: Option<i64>,
}

impl ChecklistRule {
    pub fn new(step_id: Option<i64>) -> Self {
        Self { step_id }
    }

    pub fn applies_to(&self, step_id: i64) -> bool {
        self.step_id == Some(step_id)
    }

    /// Flips `check`. Completing the checklist emits exactly one PASS result
    /// carrying the full checklist as its metrics.
    pub fn toggle(
        &self,
        unit_id: &str,
        step_id: i64,
        current: Option<&SubChecks>,
        check: Check,
    ) -> Result<ChecklistToggle, AppError> {
        if !self.applies_to(step_id) {
            return Err(AppError::Validation(format!(
                "Step {} has no checklist",
                step_id
            )));
        }
        let mut sub_checks = normalized(current);
        let was_complete = is_complete(&sub_checks);
        let flipped = !sub_checks.get(check.name()).copied().unwrap_or(false);
        sub_checks.insert(check.name().to_string(), flipped);

        let result = if !was_complete && is_complete(&sub_checks) {
            Some(
                CreateResultRequest::builder()
                    .unit_id(unit_id.to_string())
                    .step_id(step_id)
                    .passed(true)
                    .metrics(as_metrics(&sub_checks))
                    .build(),
            )
        } else {
            None
        };
        Ok(ChecklistToggle { sub_checks, result })
    }

    /// PASS/FAIL quick action. The checklist step only completes through its checks.
    pub fn quick_result(
        &self,
        unit_id: &str,
        step_id: i64,
        passed: bool,
        finished_at: Option<String>,
    ) -> Result<CreateResultRequest, AppError> {
        let unit_id = unit_id.trim();
        if unit_id.is_empty() {
            return Err(AppError::Validation("Unit id must not be empty".to_string()));
        }
        if !passed && self.applies_to(step_id) {
            return Err(AppError::Validation(format!(
                "Step {} cannot be failed from the quick action",
                step_id
            )));
        }
        Ok(CreateResultRequest::builder()
            .unit_id(unit_id.to_string())
            .step_id(step_id)
            .passed(passed)
            .maybe_finished_at(finished_at)
            .build())
    }
}

pub fn is_complete(sub_checks: &SubChecks) -> bool {
    ALL_CHECKS
        .iter()
        .all(|check| sub_checks.get(check.name()).copied().unwrap_or(false))
}

// Missing checks read as false; unknown keys from the server are kept.
fn normalized(current: Option<&SubChecks>) -> SubChecks {
    let mut sub_checks = current.cloned().unwrap_or_default();
    for check in ALL_CHECKS {
        sub_checks.entry(check.name().to_string()).or_insert(false);
    }
    sub_checks
}

fn as_metrics(sub_checks: &SubChecks) -> Map<String, Value> {
    sub_checks
        .iter()
        .map(|(name, checked)| (name.clone(), Value::Bool(*checked)))
        .collect()
}
