use crate::api::{ApiResponse, AppError, AppState};
use crate::result::model::TestResult;
use crate::result::service::EvidenceFile;
use axum::extract::{Multipart, Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Debug)]
pub struct QuickResultRequest {
    pub unit_id: String,
    pub step_id: i64,
    pub passed: bool,
    #[serde(default)]
    pub finished_at: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct UploadReport {
    pub uploaded: usize,
}

pub async fn record_result(
    State(state): State<AppState>,
    Json(request): Json<QuickResultRequest>,
) -> Result<ApiResponse<TestResult>, AppError> {
    let create = state.checklist.quick_result(
        &request.unit_id,
        request.step_id,
        request.passed,
        request.finished_at,
    )?;
    let (_, store) = state.remote().await?;
    let result = store.results().create(&create).await?;
    state.caches.invalidate_assignments(&result.unit_id).await;
    Ok(ApiResponse(result))
}

pub async fn upload_files(
    Path(result_id): Path<i64>,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<ApiResponse<UploadReport>, AppError> {
    let (_, store) = state.remote().await?;
    let files = read_files(multipart).await?;
    let uploaded = store.results().upload_evidence(result_id, files).await;
    // the owning unit is unknown here, and a partial upload still changed it
    state.caches.details.invalidate_all().await;
    Ok(ApiResponse(UploadReport { uploaded: uploaded? }))
}

async fn read_files(mut multipart: Multipart) -> Result<Vec<EvidenceFile>, AppError> {
    let mut files = vec![];
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid upload: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("evidence_{}", files.len() + 1));
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Invalid upload: {}", e)))?;
        files.push(EvidenceFile {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }
    Ok(files)
}
