use crate::assignment::service::AssignmentOperations;
use crate::export::service::ExportOperations;
use crate::http::ApiClient;
use crate::notification::service::NotificationOperations;
use crate::result::service::ResultOperations;
use crate::session::service::AuthOperations;
use crate::step::service::StepOperations;
use crate::unit::service::UnitOperations;

/// Entry point to the remote data store, one accessor per resource.
#[derive(Clone)]
pub struct RemoteStore {
    client: ApiClient,
}

impl RemoteStore {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn authorized(&self, token: &str) -> Self {
        Self {
            client: self.client.authorized(token),
        }
    }

    pub fn auth(&self) -> AuthOperations {
        AuthOperations {
            client: self.client.clone(),
        }
    }

    pub fn units(&self) -> UnitOperations {
        UnitOperations {
            client: self.client.clone(),
        }
    }

    pub fn steps(&self) -> StepOperations {
        StepOperations {
            client: self.client.clone(),
        }
    }

    pub fn assignments(&self) -> AssignmentOperations {
        AssignmentOperations {
            client: self.client.clone(),
        }
    }

    pub fn results(&self) -> ResultOperations {
        ResultOperations {
            client: self.client.clone(),
        }
    }

    pub fn notifications(&self) -> NotificationOperations {
        NotificationOperations {
            client: self.client.clone(),
        }
    }

    pub fn exports(&self) -> ExportOperations {
        ExportOperations {
            client: self.client.clone(),
        }
    }
}
