use crate::api::{ApiResponse, AppError, AppState};
use crate::session::model::{LoginRequest, SessionInfo};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<ApiResponse<SessionInfo>, AppError> {
    let session = state.session.login(&state.store.auth(), &request.name).await?;
    // cached data belongs to whoever was logged in before
    state.caches.invalidate_everything().await;
    state.schedule.lock().await.discard_all();
    Ok(ApiResponse(SessionInfo::from(&session)))
}

pub async fn logout(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.session.logout().await?;
    state.caches.invalidate_everything().await;
    state.schedule.lock().await.discard_all();
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_session(State(state): State<AppState>) -> Result<ApiResponse<SessionInfo>, AppError> {
    let session = state.session.require().await?;
    Ok(ApiResponse(SessionInfo::from(&session)))
}
