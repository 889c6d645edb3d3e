use crate::api::AppError;
use crate::cache::Caches;
use crate::status::classify::Classifier;
use crate::status::progress::unit_progress;
use crate::step::model::Step;
use crate::store::RemoteStore;
use crate::result::model::latest_by_step;
use crate::time::format_date;
use crate::unit::model::{UnitDetails, UnitSummary};
use crate::view::load::{load_details, load_steps, load_units};
use crate::view::model::{MatrixCell, MatrixRow, MatrixView, StepColumn};
use chrono::NaiveDate;
use futures::future::join_all;
use std::collections::HashMap;
use tracing::{info, warn};

pub fn build_row(
    classifier: &Classifier,
    unit: &UnitSummary,
    steps: &[Step],
    details: Result<&UnitDetails, String>,
    today: NaiveDate,
) -> MatrixRow {
    let details = match details {
        Ok(details) => details,
        Err(error) => {
            return MatrixRow {
                unit_id: unit.id.clone(),
                unit_status: unit.status.clone(),
                progress: None,
                cells: vec![],
                error: Some(error),
            }
        }
    };
    let assignments: HashMap<i64, _> = details
        .assignments
        .iter()
        .map(|assignment| (assignment.step_id, assignment))
        .collect();
    let results = latest_by_step(&details.results);
    let cells = steps
        .iter()
        .map(|step| MatrixCell {
            step_id: step.id,
            status: classifier.classify(
                assignments.get(&step.id).copied(),
                results.get(&step.id).copied(),
                today,
            ),
        })
        .collect();
    MatrixRow {
        unit_id: unit.id.clone(),
        unit_status: details.unit.status.clone(),
        progress: Some(unit_progress(&details.assignments, &details.results, steps)),
        cells,
        error: None,
    }
}

/// Units × steps. Unit details are fetched concurrently; a unit whose fetch
/// fails shows up as a row with an error instead of failing the view.
pub async fn load_matrix(
    store: &RemoteStore,
    caches: &Caches,
    classifier: &Classifier,
    today: NaiveDate,
) -> Result<MatrixView, AppError> {
    let units = load_units(store, caches).await?;
    let steps = load_steps(store, caches).await?;
    let details = join_all(units.iter().map(|unit| load_details(store, caches, &unit.id))).await;

    let failed = details.iter().filter(|d| d.is_err()).count();
    if failed > 0 {
        warn!("matrix: {} of {} unit fetches failed", failed, units.len());
    }
    info!("matrix: {} units x {} steps", units.len(), steps.len());

    let rows = units
        .iter()
        .zip(details.iter())
        .map(|(unit, details)| {
            build_row(
                classifier,
                unit,
                &steps,
                details.as_ref().map_err(|e| e.to_string()),
                today,
            )
        })
        .collect();
    Ok(MatrixView {
        today: format_date(&today),
        steps: steps.iter().map(StepColumn::from).collect(),
        rows,
    })
}
