use crate::api::{ApiResponse, AppError, AppState};
use crate::view::matrix::load_matrix;
use crate::view::model::{MatrixView, QueueItem};
use crate::view::queue::{load_queue, queue_tester, QueueOptions};
use axum::extract::{Query, State};
use serde::Deserialize;

#[derive(Deserialize, Debug, Default)]
pub struct QueueParams {
    pub tester_id: Option<String>,
    #[serde(default)]
    pub actionable: bool,
}

pub async fn matrix_view(State(state): State<AppState>) -> Result<ApiResponse<MatrixView>, AppError> {
    let (_, store) = state.remote().await?;
    ApiResponse::from(load_matrix(&store, &state.caches, &state.classifier, state.today()).await)
}

pub async fn queue_view(
    Query(params): Query<QueueParams>,
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<QueueItem>>, AppError> {
    let (session, store) = state.remote().await?;
    let options = QueueOptions {
        tester_id: queue_tester(&session, params.tester_id)?,
        actionable_only: params.actionable,
    };
    ApiResponse::from(
        load_queue(
            &store,
            &state.caches,
            &state.classifier,
            &state.checklist,
            options,
            state.today(),
        )
        .await,
    )
}
