use crate::api::{ApiResponse, AppError, AppState};
use crate::assignment::model::{Assignment, AssignmentFilter, AssignmentPatch};
use crate::checklist::Check;
use crate::result::model::TestResult;
use crate::view::load::load_assignments;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Serialize;
use tracing::info;

pub async fn list_assignments(
    Query(filter): Query<AssignmentFilter>,
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<Assignment>>, AppError> {
    let (_, store) = state.remote().await?;
    ApiResponse::from(load_assignments(&store, &state.caches, &filter).await)
}

pub async fn patch_assignment(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(patch): Json<AssignmentPatch>,
) -> Result<ApiResponse<Assignment>, AppError> {
    let (_, store) = state.remote().await?;
    let assignment = store.assignments().patch(id, &patch).await?;
    state.caches.invalidate_assignments(&assignment.unit_id).await;
    Ok(ApiResponse(assignment))
}

#[derive(Serialize, Debug)]
pub struct ToggleOutcome {
    pub assignment: Assignment,
    pub result: Option<TestResult>,
}

/// Flips one sub-check. When that completes the checklist, the PASS result
/// is recorded right after the sub-checks are saved.
pub async fn toggle_check(
    Path((id, check)): Path<(i64, String)>,
    State(state): State<AppState>,
) -> Result<ApiResponse<ToggleOutcome>, AppError> {
    let check: Check = check.parse()?;
    let (_, store) = state.remote().await?;
    let assignments = load_assignments(&store, &state.caches, &AssignmentFilter::all()).await?;
    let current = assignments
        .into_iter()
        .find(|assignment| assignment.id == id)
        .ok_or_else(|| AppError::NotFound(format!("Assignment {} not found", id)))?;
    if current.skipped {
        return Err(AppError::Validation(format!(
            "Assignment {} is skipped; its checklist cannot be changed",
            id
        )));
    }

    let toggle = state.checklist.toggle(
        &current.unit_id,
        current.step_id,
        current.sub_checks.as_ref(),
        check,
    )?;
    let patch = AssignmentPatch {
        sub_checks: Some(toggle.sub_checks),
        ..Default::default()
    };
    let assignment = store.assignments().patch(id, &patch).await?;
    state.caches.invalidate_assignments(&assignment.unit_id).await;

    let result = match toggle.result {
        Some(request) => {
            info!("checklist complete for unit {} step {}", request.unit_id, request.step_id);
            let result = store.results().create(&request).await?;
            state.caches.invalidate_assignments(&assignment.unit_id).await;
            Some(result)
        }
        None => None,
    };
    Ok(ApiResponse(ToggleOutcome { assignment, result }))
}
