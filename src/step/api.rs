use crate::api::{ApiResponse, AppError, AppState};
use crate::step::model::Step;
use crate::view::load::load_steps;
use axum::extract::State;

pub async fn list_steps(State(state): State<AppState>) -> Result<ApiResponse<Vec<Step>>, AppError> {
    let (_, store) = state.remote().await?;
    ApiResponse::from(load_steps(&store, &state.caches).await)
}
