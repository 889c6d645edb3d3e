use crate::api::{ApiResponse, AppError, AppState};
use crate::assignment::model::{Assignment, AssignmentFilter, AssignmentPatch};
use crate::schedule::buffer::SaveReport;
use crate::view::load::load_assignments;
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

#[derive(Serialize, Debug)]
pub struct ScheduleView {
    pub assignments: Vec<Assignment>,
    pub dirty: Vec<i64>,
}

#[derive(Serialize, Debug)]
pub struct PendingCount {
    pub dirty: usize,
}

pub async fn get_schedule(State(state): State<AppState>) -> Result<ApiResponse<ScheduleView>, AppError> {
    let (_, store) = state.remote().await?;
    let fetched = load_assignments(&store, &state.caches, &AssignmentFilter::all()).await?;
    let buffer = state.schedule.lock().await;
    let assignments = buffer.merged(&fetched);
    let dirty = assignments
        .iter()
        .filter(|assignment| buffer.pending(assignment.id).is_some_and(|p| p.dirty))
        .map(|assignment| assignment.id)
        .collect();
    Ok(ApiResponse(ScheduleView { assignments, dirty }))
}

pub async fn edit_assignment(
    Path(assignment_id): Path<i64>,
    State(state): State<AppState>,
    Json(change): Json<AssignmentPatch>,
) -> Result<ApiResponse<PendingCount>, AppError> {
    state.session.require().await?;
    let mut buffer = state.schedule.lock().await;
    buffer.edit(assignment_id, change);
    Ok(ApiResponse(PendingCount {
        dirty: buffer.dirty_count(),
    }))
}

pub async fn discard_edit(
    Path(assignment_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<ApiResponse<PendingCount>, AppError> {
    state.session.require().await?;
    let mut buffer = state.schedule.lock().await;
    if !buffer.discard(assignment_id) {
        return Err(AppError::NotFound(format!(
            "No pending edit for assignment {}",
            assignment_id
        )));
    }
    Ok(ApiResponse(PendingCount {
        dirty: buffer.dirty_count(),
    }))
}

pub async fn discard_all(State(state): State<AppState>) -> Result<ApiResponse<PendingCount>, AppError> {
    state.session.require().await?;
    state.schedule.lock().await.discard_all();
    Ok(ApiResponse(PendingCount { dirty: 0 }))
}

pub async fn save_schedule(State(state): State<AppState>) -> Result<ApiResponse<SaveReport>, AppError> {
    let store = state.supervisor("save the schedule").await?;
    let assignments = store.assignments();
    let operations = &assignments;
    let outcome = state
        .schedule
        .lock()
        .await
        .save(move |id, change| async move { operations.patch(id, &change).await })
        .await;
    // saved entries stay saved even when a later one failed
    state.caches.assignments.invalidate_all().await;
    state.caches.details.invalidate_all().await;
    state.caches.units.invalidate(&()).await;
    ApiResponse::from(outcome)
}
