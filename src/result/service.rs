use crate::api::AppError;
use crate::http::{ApiClient, Endpoint, HttpMethod, HttpRequest};
use crate::result::model::{CreateResultRequest, TestResult};
use reqwest::multipart::{Form, Part};
use tracing::{info, warn};

/// One file picked for upload.
#[derive(Debug, Clone)]
pub struct EvidenceFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

pub struct ResultOperations {
    pub(crate) client: ApiClient,
}

impl ResultOperations {
    pub async fn create(&self, request: &CreateResultRequest) -> Result<TestResult, AppError> {
        info!(
            "recording {} for unit {} step {}",
            if request.passed { "PASS" } else { "FAIL" },
            request.unit_id,
            request.step_id
        );
        let result = self
            .client
            .execute(HttpRequest::json(
                Endpoint::new(HttpMethod::POST, &["results"]),
                request,
            )?)
            .await?;
        Ok(result)
    }

    /// Uploads files one request at a time. The first failure is returned;
    /// files already uploaded stay attached.
    pub async fn upload_evidence(
        &self,
        result_id: i64,
        files: Vec<EvidenceFile>,
    ) -> Result<usize, AppError> {
        if files.is_empty() {
            return Err(AppError::Validation("No files selected".to_string()));
        }
        let total = files.len();
        for (index, file) in files.into_iter().enumerate() {
            let file_name = file.file_name.clone();
            let form = Form::new().part("file", build_part(file)?);
            let upload = self
                .client
                .execute_empty(HttpRequest::multipart(
                    Endpoint::new(HttpMethod::POST, &["results", &result_id.to_string(), "files"]),
                    form,
                ))
                .await;
            if let Err(err) = upload {
                warn!(
                    "upload of {} failed after {} of {} files: {}",
                    file_name, index, total, err
                );
                return Err(err.into());
            }
        }
        Ok(total)
    }
}

fn build_part(file: EvidenceFile) -> Result<Part, AppError> {
    let part = Part::bytes(file.bytes).file_name(file.file_name);
    match file.content_type {
        Some(content_type) => part
            .mime_str(&content_type)
            .map_err(|e| AppError::Validation(format!("Invalid content type {}: {}", content_type, e))),
        None => Ok(part),
    }
}
