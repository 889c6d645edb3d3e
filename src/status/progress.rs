use crate::assignment::model::Assignment;
use crate::result::model::{latest_by_step, TestResult};
use crate::step::model::Step;
use std::collections::HashSet;

/// Percentage of a unit's non-skipped steps whose latest result passed,
/// rounded to the nearest integer. Before assignments are loaded the whole
/// catalog counts.
pub fn unit_progress(assignments: &[Assignment], results: &[TestResult], catalog: &[Step]) -> u8 {
    let (total, eligible): (usize, HashSet<i64>) = if assignments.is_empty() {
        (catalog.len(), catalog.iter().map(|step| step.id).collect())
    } else {
        let active: Vec<&Assignment> = assignments.iter().filter(|a| !a.skipped).collect();
        (active.len(), active.iter().map(|a| a.step_id).collect())
    };
    if total == 0 {
        return 0;
    }
    let passed = latest_by_step(results)
        .into_iter()
        .filter(|(step_id, result)| result.passed && eligible.contains(step_id))
        .count();
    let percent = (passed as f64 * 100.0 / total as f64).round();
    percent.clamp(0.0, 100.0) as u8
}
