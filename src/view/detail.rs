use crate::checklist::ChecklistRule;
use crate::result::model::latest_by_step;
use crate::status::classify::Classifier;
use crate::status::progress::unit_progress;
use crate::step::model::Step;
use crate::unit::model::UnitDetails;
use crate::view::model::{UnitStepCell, UnitView};
use chrono::NaiveDate;
use std::collections::HashMap;

/// One unit with every catalog step classified, in catalog order.
pub fn build_unit_view(
    classifier: &Classifier,
    checklist: &ChecklistRule,
    details: UnitDetails,
    steps: &[Step],
    today: NaiveDate,
) -> UnitView {
    let progress = unit_progress(&details.assignments, &details.results, steps);
    let assignments: HashMap<i64, _> = details
        .assignments
        .iter()
        .map(|assignment| (assignment.step_id, assignment))
        .collect();
    let results = latest_by_step(&details.results);
    let cells = steps
        .iter()
        .map(|step| {
            let assignment = assignments.get(&step.id).copied();
            let result = results.get(&step.id).copied();
            UnitStepCell {
                step_id: step.id,
                step_name: step.name.clone(),
                order: step.order,
                required: step.required,
                checklist: checklist.applies_to(step.id),
                assignment: assignment.cloned(),
                result: result.cloned(),
                status: classifier.classify(assignment, result, today),
            }
        })
        .collect();
    UnitView {
        unit: details.unit.clone(),
        progress,
        cells,
    }
}
