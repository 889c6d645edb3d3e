use crate::api::{AppError, AppState};
use crate::export::model::{Attachment, BulkTravellerPayload};
use axum::extract::{Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

impl IntoResponse for Attachment {
    fn into_response(self) -> Response {
        let disposition = format!("attachment; filename=\"{}\"", self.file_name);
        (
            StatusCode::OK,
            [(CONTENT_TYPE, self.content_type), (CONTENT_DISPOSITION, disposition)],
            self.bytes,
        )
            .into_response()
    }
}

pub async fn unit_evidence(
    Path(unit_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Attachment, AppError> {
    let (_, store) = state.remote().await?;
    store.exports().unit_evidence(&unit_id).await
}

pub async fn step_evidence(
    Path((unit_id, step_id)): Path<(String, i64)>,
    State(state): State<AppState>,
) -> Result<Attachment, AppError> {
    let (_, store) = state.remote().await?;
    store.exports().step_evidence(&unit_id, step_id).await
}

pub async fn unit_traveller(
    Path(unit_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Attachment, AppError> {
    let (_, store) = state.remote().await?;
    store.exports().unit_traveller(&unit_id).await
}

pub async fn bulk_traveller(
    State(state): State<AppState>,
    Json(payload): Json<BulkTravellerPayload>,
) -> Result<Attachment, AppError> {
    let store = state.supervisor("export traveller logs").await?;
    store.exports().bulk_traveller(&payload.unit_ids).await
}
