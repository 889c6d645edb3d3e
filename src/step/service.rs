use crate::api::AppError;
use crate::http::{ApiClient, Endpoint, HttpMethod, HttpRequest};
use crate::step::model::{sort_steps, Step};

pub struct StepOperations {
    pub(crate) client: ApiClient,
}

impl StepOperations {
    pub async fn list(&self) -> Result<Vec<Step>, AppError> {
        let mut steps: Vec<Step> = self
            .client
            .execute(HttpRequest::new(Endpoint::new(HttpMethod::GET, &["steps"])))
            .await?;
        sort_steps(&mut steps);
        Ok(steps)
    }
}
