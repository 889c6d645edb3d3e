use crate::api::{ApiResponse, AppError, AppState};
use crate::unit::model::{CreateUnitRequest, DuplicateScheduleRequest, RenameUnitRequest, UnitSummary};
use crate::view::detail::build_unit_view;
use crate::view::load::{load_steps, load_units};
use crate::view::model::UnitView;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

pub async fn list_units(State(state): State<AppState>) -> Result<ApiResponse<Vec<UnitSummary>>, AppError> {
    let (_, store) = state.remote().await?;
    ApiResponse::from(load_units(&store, &state.caches).await)
}

/// Always fetched from the remote store so a missing unit comes back as the
/// store's own 404; the cache is warmed with whatever came back.
pub async fn get_unit(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<ApiResponse<UnitView>, AppError> {
    let (_, store) = state.remote().await?;
    let ticket = state.caches.details.begin(&id).await;
    let details = match store.units().get(&id).await {
        Ok(details) => {
            state.caches.details.complete(ticket, Ok(details.clone())).await;
            details
        }
        Err(err) => {
            state.caches.details.complete(ticket, Err(err.to_string())).await;
            return Err(err);
        }
    };
    let steps = load_steps(&store, &state.caches).await?;
    Ok(ApiResponse(build_unit_view(
        &state.classifier,
        &state.checklist,
        details,
        &steps,
        state.today(),
    )))
}

pub async fn create_unit(
    State(state): State<AppState>,
    Json(request): Json<CreateUnitRequest>,
) -> Result<ApiResponse<UnitSummary>, AppError> {
    let store = state.supervisor("create units").await?;
    let unit = store.units().create(request).await?;
    state.caches.units.invalidate(&()).await;
    Ok(ApiResponse(unit))
}

pub async fn rename_unit(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<RenameUnitRequest>,
) -> Result<ApiResponse<UnitSummary>, AppError> {
    let store = state.supervisor("rename units").await?;
    let unit = store.units().rename(&id, &request.new_id).await?;
    state.caches.invalidate_unit(&id).await;
    state.caches.invalidate_unit(&unit.id).await;
    Ok(ApiResponse(unit))
}

pub async fn delete_unit(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let store = state.supervisor("delete units").await?;
    store.units().delete(&id).await?;
    state.caches.invalidate_unit(&id).await;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn duplicate_schedule(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<DuplicateScheduleRequest>,
) -> Result<ApiResponse<Vec<UnitSummary>>, AppError> {
    let store = state.supervisor("duplicate schedules").await?;
    let units = store.units().duplicate_schedule(&id, request).await?;
    for unit in &units {
        state.caches.invalidate_unit(&unit.id).await;
    }
    state.caches.invalidate_unit(&id).await;
    Ok(ApiResponse(units))
}
