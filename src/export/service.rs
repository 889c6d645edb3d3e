use crate::api::AppError;
use crate::export::model::{
    step_evidence_name, traveller_name, unit_evidence_name, Attachment, BULK_TRAVELLER_NAME,
};
use crate::http::{ApiClient, Download, Endpoint, HttpMethod, HttpRequest};
use serde::Serialize;
use tracing::info;

pub struct ExportOperations {
    pub(crate) client: ApiClient,
}

#[derive(Serialize)]
struct BulkTravellerRequest<'a> {
    unit_ids: &'a [String],
}

impl ExportOperations {
    pub async fn unit_evidence(&self, unit_id: &str) -> Result<Attachment, AppError> {
        let download = self
            .client
            .download(HttpRequest::new(Endpoint::new(
                HttpMethod::GET,
                &["export", "units", unit_id, "evidence"],
            )))
            .await?;
        Ok(attach(unit_evidence_name(unit_id), download))
    }

    pub async fn step_evidence(&self, unit_id: &str, step_id: i64) -> Result<Attachment, AppError> {
        let download = self
            .client
            .download(HttpRequest::new(Endpoint::new(
                HttpMethod::GET,
                &["export", "units", unit_id, "steps", &step_id.to_string(), "evidence"],
            )))
            .await?;
        Ok(attach(step_evidence_name(unit_id, step_id), download))
    }

    pub async fn unit_traveller(&self, unit_id: &str) -> Result<Attachment, AppError> {
        let download = self
            .client
            .download(HttpRequest::new(Endpoint::new(
                HttpMethod::GET,
                &["export", "units", unit_id, "traveller"],
            )))
            .await?;
        Ok(attach(traveller_name(unit_id), download))
    }

    pub async fn bulk_traveller(&self, unit_ids: &[String]) -> Result<Attachment, AppError> {
        let unit_ids: Vec<String> = unit_ids
            .iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect();
        if unit_ids.is_empty() {
            return Err(AppError::Validation("Select at least one unit".to_string()));
        }
        info!("exporting traveller logs for {} units", unit_ids.len());
        let download = self
            .client
            .download(HttpRequest::json(
                Endpoint::new(HttpMethod::POST, &["export", "traveller"]),
                &BulkTravellerRequest { unit_ids: &unit_ids },
            )?)
            .await?;
        Ok(attach(BULK_TRAVELLER_NAME.to_string(), download))
    }
}

fn attach(file_name: String, download: Download) -> Attachment {
    Attachment {
        file_name,
        content_type: download.content_type,
        bytes: download.bytes,
    }
}
