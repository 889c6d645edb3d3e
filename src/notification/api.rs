use crate::api::{ApiResponse, AppError, AppState};
use crate::notification::model::{unread_count, Notification};
use crate::view::load::settle;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Serialize;

#[derive(Serialize, Debug)]
pub struct NotificationList {
    pub unread: usize,
    pub items: Vec<Notification>,
}

pub async fn list_notifications(
    State(state): State<AppState>,
) -> Result<ApiResponse<NotificationList>, AppError> {
    let (_, store) = state.remote().await?;
    let notifications = store.notifications();
    let items = settle(
        state
            .caches
            .notifications
            .fetch(&(), || notifications.list())
            .await,
    )?;
    Ok(ApiResponse(NotificationList {
        unread: unread_count(&items),
        items,
    }))
}

pub async fn mark_read(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let (_, store) = state.remote().await?;
    store.notifications().mark_read(id).await?;
    state.caches.notifications.invalidate(&()).await;
    Ok(StatusCode::NO_CONTENT)
}
