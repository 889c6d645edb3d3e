use crate::api::AppError;
use crate::assignment::model::{Assignment, AssignmentFilter, AssignmentPatch};
use crate::http::{ApiClient, Endpoint, HttpMethod, HttpRequest};
use tracing::info;

pub struct AssignmentOperations {
    pub(crate) client: ApiClient,
}

impl AssignmentOperations {
    pub async fn list(&self, filter: &AssignmentFilter) -> Result<Vec<Assignment>, AppError> {
        let endpoint = Endpoint::new(HttpMethod::GET, &["assignments"])
            .maybe_query("unit_id", filter.unit_id.as_deref())
            .maybe_query("tester_id", filter.tester_id.as_deref());
        let assignments = self.client.execute(HttpRequest::new(endpoint)).await?;
        Ok(assignments)
    }

    pub async fn patch(&self, id: i64, patch: &AssignmentPatch) -> Result<Assignment, AppError> {
        if patch.is_empty() {
            return Err(AppError::Validation("Nothing to update".to_string()));
        }
        info!("patching assignment {}", id);
        let assignment = self
            .client
            .execute(HttpRequest::json(
                Endpoint::new(HttpMethod::PATCH, &["assignments", &id.to_string()]),
                patch,
            )?)
            .await?;
        Ok(assignment)
    }
}
