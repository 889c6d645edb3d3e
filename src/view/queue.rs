use crate::api::AppError;
use crate::assignment::model::{Assignment, AssignmentFilter};
use crate::cache::Caches;
use crate::checklist::ChecklistRule;
use crate::result::model::{latest_by_step, TestResult};
use crate::session::model::Session;
use crate::status::classify::Classifier;
use crate::status::model::StatusKind;
use crate::step::model::Step;
use crate::store::RemoteStore;
use crate::time::parse_date;
use crate::view::load::{load_assignments, load_details, load_steps};
use crate::view::model::QueueItem;
use chrono::NaiveDate;
use futures::future::join_all;
use std::collections::{BTreeSet, HashMap};
use tracing::warn;

pub struct QueueOptions {
    pub tester_id: String,
    pub actionable_only: bool,
}

/// Which tester's queue a session may look at: testers only see their own.
pub fn queue_tester(session: &Session, requested: Option<String>) -> Result<String, AppError> {
    match requested.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) {
        Some(tester_id) if session.is_supervisor() => Ok(tester_id),
        Some(tester_id) if tester_id == session.user.id => Ok(tester_id),
        Some(_) => Err(AppError::Forbidden(
            "Testers can only view their own queue".to_string(),
        )),
        None => Ok(session.user.id.clone()),
    }
}

pub fn build_queue(
    classifier: &Classifier,
    checklist: &ChecklistRule,
    assignments: &[Assignment],
    steps: &[Step],
    results_by_unit: &HashMap<String, Vec<TestResult>>,
    today: NaiveDate,
    actionable_only: bool,
) -> Vec<QueueItem> {
    let steps_by_id: HashMap<i64, &Step> = steps.iter().map(|step| (step.id, step)).collect();
    let latest: HashMap<&str, HashMap<i64, &TestResult>> = results_by_unit
        .iter()
        .map(|(unit_id, results)| (unit_id.as_str(), latest_by_step(results)))
        .collect();

    let mut items: Vec<QueueItem> = assignments
        .iter()
        .filter(|assignment| !assignment.skipped)
        .map(|assignment| {
            let result = latest
                .get(assignment.unit_id.as_str())
                .and_then(|by_step| by_step.get(&assignment.step_id))
                .copied();
            let step = steps_by_id.get(&assignment.step_id);
            QueueItem {
                assignment_id: assignment.id,
                unit_id: assignment.unit_id.clone(),
                step_id: assignment.step_id,
                step_name: step
                    .map(|s| s.name.clone())
                    .unwrap_or_else(|| format!("Step {}", assignment.step_id)),
                step_order: step.map(|s| s.order).unwrap_or(i64::MAX),
                tester_id: assignment.tester_id.clone(),
                start_at: assignment.start_at.clone(),
                end_at: assignment.end_at.clone(),
                remark: assignment.remark.clone(),
                sub_checks: assignment.sub_checks.clone(),
                checklist: checklist.applies_to(assignment.step_id),
                status: classifier.classify(Some(assignment), result, today),
            }
        })
        .filter(|item| !actionable_only || item.status.kind != StatusKind::Pass)
        .collect();

    // scheduled work first, earliest start on top; unscheduled last
    items.sort_by(|a, b| {
        let a_start = parse_date(a.start_at.as_deref());
        let b_start = parse_date(b.start_at.as_deref());
        a_start
            .is_none()
            .cmp(&b_start.is_none())
            .then(a_start.cmp(&b_start))
            .then_with(|| a.unit_id.cmp(&b.unit_id))
            .then(a.step_order.cmp(&b.step_order))
    });
    items
}

pub async fn load_queue(
    store: &RemoteStore,
    caches: &Caches,
    classifier: &Classifier,
    checklist: &ChecklistRule,
    options: QueueOptions,
    today: NaiveDate,
) -> Result<Vec<QueueItem>, AppError> {
    let filter = AssignmentFilter::for_tester(&options.tester_id);
    let assignments = load_assignments(store, caches, &filter).await?;
    let steps = load_steps(store, caches).await?;

    let unit_ids: BTreeSet<&str> = assignments
        .iter()
        .filter(|a| !a.skipped)
        .map(|a| a.unit_id.as_str())
        .collect();
    let fetched = join_all(unit_ids.iter().map(|unit_id| async move {
        (unit_id.to_string(), load_details(store, caches, unit_id).await)
    }))
    .await;

    let mut results_by_unit = HashMap::new();
    for (unit_id, details) in fetched {
        match details {
            Ok(details) => {
                results_by_unit.insert(unit_id, details.results);
            }
            // the queue still shows the assignment, classified without a result
            Err(err) => warn!("queue: results for {} unavailable: {}", unit_id, err),
        }
    }

    Ok(build_queue(
        classifier,
        checklist,
        &assignments,
        &steps,
        &results_by_unit,
        today,
        options.actionable_only,
    ))
}
