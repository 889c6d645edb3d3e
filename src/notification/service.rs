use crate::api::AppError;
use crate::http::{ApiClient, Endpoint, HttpMethod, HttpRequest};
use crate::notification::model::Notification;

pub struct NotificationOperations {
    pub(crate) client: ApiClient,
}

impl NotificationOperations {
    pub async fn list(&self) -> Result<Vec<Notification>, AppError> {
        let notifications = self
            .client
            .execute(HttpRequest::new(Endpoint::new(HttpMethod::GET, &["notifications"])))
            .await?;
        Ok(notifications)
    }

    pub async fn mark_read(&self, id: i64) -> Result<(), AppError> {
        self.client
            .execute_empty(HttpRequest::new(Endpoint::new(
                HttpMethod::POST,
                &["notifications", &id.to_string(), "read"],
            )))
            .await?;
        Ok(())
    }
}
