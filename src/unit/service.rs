use crate::api::AppError;
use crate::http::{ApiClient, Endpoint, HttpMethod, HttpRequest};
use crate::unit::model::{
    CreateUnitRequest, DuplicateScheduleRequest, RenameUnitRequest, UnitDetails, UnitSummary,
};
use std::collections::HashSet;
use tracing::info;

pub struct UnitOperations {
    pub(crate) client: ApiClient,
}

impl UnitOperations {
    pub async fn list(&self) -> Result<Vec<UnitSummary>, AppError> {
        let units = self
            .client
            .execute(HttpRequest::new(Endpoint::new(HttpMethod::GET, &["units"])))
            .await?;
        Ok(units)
    }

    pub async fn get(&self, id: &str) -> Result<UnitDetails, AppError> {
        let details = self
            .client
            .execute(HttpRequest::new(Endpoint::new(HttpMethod::GET, &["units", id])))
            .await?;
        Ok(details)
    }

    pub async fn create(&self, request: CreateUnitRequest) -> Result<UnitSummary, AppError> {
        let request = validate_create(request)?;
        info!("creating unit {}", request.id);
        let unit = self
            .client
            .execute(HttpRequest::json(
                Endpoint::new(HttpMethod::POST, &["units"]),
                &request,
            )?)
            .await?;
        Ok(unit)
    }

    pub async fn rename(&self, id: &str, new_id: &str) -> Result<UnitSummary, AppError> {
        let new_id = validate_rename(id, new_id)?;
        info!("renaming unit {} to {}", id, new_id);
        let unit = self
            .client
            .execute(HttpRequest::json(
                Endpoint::new(HttpMethod::PATCH, &["units", id]),
                &RenameUnitRequest { new_id },
            )?)
            .await?;
        Ok(unit)
    }

    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        info!("deleting unit {}", id);
        self.client
            .execute_empty(HttpRequest::new(Endpoint::new(HttpMethod::DELETE, &["units", id])))
            .await?;
        Ok(())
    }

    pub async fn duplicate_schedule(
        &self,
        id: &str,
        request: DuplicateScheduleRequest,
    ) -> Result<Vec<UnitSummary>, AppError> {
        let request = validate_duplicate(id, request)?;
        info!(
            "duplicating schedule of {} onto {:?} shifted by {} days",
            id, request.new_unit_ids, request.day_offset
        );
        let units = self
            .client
            .execute(HttpRequest::json(
                Endpoint::new(HttpMethod::POST, &["units", id, "duplicate"]),
                &request,
            )?)
            .await?;
        Ok(units)
    }
}

pub fn validate_create(request: CreateUnitRequest) -> Result<CreateUnitRequest, AppError> {
    let id = request.id.trim().to_string();
    if id.is_empty() {
        return Err(AppError::Validation("Unit id must not be empty".to_string()));
    }
    Ok(CreateUnitRequest {
        id,
        sku: non_blank(request.sku),
        lot: non_blank(request.lot),
    })
}

pub fn validate_rename(id: &str, new_id: &str) -> Result<String, AppError> {
    let new_id = new_id.trim();
    if new_id.is_empty() {
        return Err(AppError::Validation("New unit id must not be empty".to_string()));
    }
    if new_id == id.trim() {
        return Err(AppError::Validation(format!("Unit is already named {}", new_id)));
    }
    Ok(new_id.to_string())
}

pub fn validate_duplicate(
    id: &str,
    request: DuplicateScheduleRequest,
) -> Result<DuplicateScheduleRequest, AppError> {
    if request.new_unit_ids.is_empty() {
        return Err(AppError::Validation("At least one new unit id is required".to_string()));
    }
    let mut seen = HashSet::new();
    let mut new_unit_ids = Vec::with_capacity(request.new_unit_ids.len());
    for raw in request.new_unit_ids {
        let new_id = raw.trim().to_string();
        if new_id.is_empty() {
            return Err(AppError::Validation("New unit ids must not be empty".to_string()));
        }
        if new_id == id.trim() {
            return Err(AppError::Validation(format!("{} is the source unit", new_id)));
        }
        if !seen.insert(new_id.clone()) {
            return Err(AppError::Validation(format!("{} is listed more than once", new_id)));
        }
        new_unit_ids.push(new_id);
    }
    Ok(DuplicateScheduleRequest {
        new_unit_ids,
        day_offset: request.day_offset,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
