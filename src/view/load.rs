use crate::api::AppError;
use crate::assignment::model::{Assignment, AssignmentFilter};
use crate::cache::query::QueryState;
use crate::cache::Caches;
use crate::step::model::Step;
use crate::store::RemoteStore;
use crate::unit::model::{UnitDetails, UnitSummary};

/// Data for a view: fresh data, or the last good copy when the latest
/// refresh failed.
pub fn settle<T>(state: QueryState<T>) -> Result<T, AppError> {
    match state {
        QueryState::Data { data } => Ok(data),
        QueryState::Error { data: Some(data), .. } => Ok(data),
        QueryState::Error { message, data: None } => Err(AppError::Transport(message)),
        QueryState::Loading => Err(AppError::Transport("Still loading".to_string())),
    }
}

pub async fn load_units(store: &RemoteStore, caches: &Caches) -> Result<Vec<UnitSummary>, AppError> {
    let units = store.units();
    settle(caches.units.fetch(&(), || units.list()).await)
}

pub async fn load_steps(store: &RemoteStore, caches: &Caches) -> Result<Vec<Step>, AppError> {
    let steps = store.steps();
    settle(caches.steps.fetch(&(), || steps.list()).await)
}

pub async fn load_details(
    store: &RemoteStore,
    caches: &Caches,
    unit_id: &str,
) -> Result<UnitDetails, AppError> {
    let units = store.units();
    settle(
        caches
            .details
            .fetch(&unit_id.to_string(), || units.get(unit_id))
            .await,
    )
}

pub async fn load_assignments(
    store: &RemoteStore,
    caches: &Caches,
    filter: &AssignmentFilter,
) -> Result<Vec<Assignment>, AppError> {
    let assignments = store.assignments();
    settle(
        caches
            .assignments
            .fetch(filter, || assignments.list(filter))
            .await,
    )
}
