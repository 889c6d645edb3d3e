use crate::assignment::api::{list_assignments, patch_assignment, toggle_check};
use crate::cache::Caches;
use crate::checklist::ChecklistRule;
use crate::export::api::{bulk_traveller, step_evidence, unit_evidence, unit_traveller};
use crate::http::HttpError;
use crate::notification::api::{list_notifications, mark_read};
use crate::result::api::{record_result, upload_files};
use crate::schedule::api::{discard_all, discard_edit, edit_assignment, get_schedule, save_schedule};
use crate::schedule::buffer::ScheduleBuffer;
use crate::session::api::{get_session, login, logout};
use crate::session::model::Session;
use crate::session::service::SessionStore;
use crate::status::classify::Classifier;
use crate::step::api::list_steps;
use crate::store::RemoteStore;
use crate::unit::api::{create_unit, delete_unit, duplicate_schedule, get_unit, list_units, rename_unit};
use crate::view::api::{matrix_view, queue_view};
use axum::extract::DefaultBodyLimit;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;
use tracing::Level;

#[derive(Clone)]
pub struct AppState {
    pub store: RemoteStore,
    pub session: Arc<SessionStore>,
    pub caches: Arc<Caches>,
    pub schedule: Arc<Mutex<ScheduleBuffer>>,
    pub classifier: Classifier,
    pub checklist: ChecklistRule,
}

impl AppState {
    pub fn new(
        store: RemoteStore,
        session: Arc<SessionStore>,
        caches: Arc<Caches>,
        classifier: Classifier,
        checklist: ChecklistRule,
    ) -> Self {
        Self {
            store,
            session,
            caches,
            schedule: Arc::new(Mutex::new(ScheduleBuffer::new())),
            classifier,
            checklist,
        }
    }

    /// The logged-in session and a store client carrying its token.
    pub async fn remote(&self) -> Result<(Session, RemoteStore), AppError> {
        let session = self.session.require().await?;
        let store = self.store.authorized(&session.token);
        Ok((session, store))
    }

    /// Like `remote`, but refuses testers before anything is sent.
    pub async fn supervisor(&self, action: &str) -> Result<RemoteStore, AppError> {
        let session = self.session.require_supervisor(action).await?;
        Ok(self.store.authorized(&session.token))
    }

    pub fn today(&self) -> NaiveDate {
        crate::time::today(&self.classifier.offset())
    }
}

/// Only the listed origins may call from a browser. The service acts with the
/// stored session, so an empty list allows no cross-origin caller at all.
pub fn cors_layer(allowed_origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([CONTENT_TYPE])
}

pub fn build_api(state: AppState, allowed_origins: Vec<HeaderValue>) -> Router {
    let cors = cors_layer(allowed_origins);

    Router::new()
        .route("/session", get(get_session))
        .route("/session/login", post(login))
        .route("/session/logout", post(logout))
        .route("/units", get(list_units).post(create_unit))
        .route("/units/:id", get(get_unit).patch(rename_unit).delete(delete_unit))
        .route("/units/:id/duplicate", post(duplicate_schedule))
        .route("/steps", get(list_steps))
        .route("/assignments", get(list_assignments))
        .route("/assignments/:id", axum::routing::patch(patch_assignment))
        .route("/assignments/:id/checks/:check", post(toggle_check))
        .route("/results", post(record_result))
        .route("/results/:id/files", post(upload_files))
        .route("/schedule", get(get_schedule).delete(discard_all))
        .route("/schedule/save", post(save_schedule))
        .route("/schedule/:assignment_id", put(edit_assignment).delete(discard_edit))
        .route("/views/matrix", get(matrix_view))
        .route("/views/queue", get(queue_view))
        .route("/notifications", get(list_notifications))
        .route("/notifications/:id/read", post(mark_read))
        .route("/export/units/:id/evidence", get(unit_evidence))
        .route("/export/units/:id/steps/:step_id/evidence", get(step_evidence))
        .route("/export/units/:id/traveller", get(unit_traveller))
        .route("/export/traveller", post(bulk_traveller))
        .layer(cors)
        .layer(DefaultBodyLimit::max(50 * 1024 * 1024))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Micros),
                ),
        )
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}

fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!("handler panicked: {}", detail);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            message: "Something went wrong".to_string(),
        }),
    )
        .into_response()
}

pub struct ApiResponse<T>(pub T);

impl<T> ApiResponse<T> {
    pub fn from(result: Result<T, AppError>) -> Result<ApiResponse<T>, AppError> {
        result.map(ApiResponse)
    }
}

impl<T> IntoResponse for ApiResponse<T>
where
    T: Serialize,
{
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self.0)).into_response()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{message}")]
    Remote { status: u16, message: String },
    #[error("{0}")]
    Transport(String),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Remote { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            AppError::Transport(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<HttpError> for AppError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Status(status, error) => AppError::Remote {
                status,
                message: error.message().to_string(),
            },
            HttpError::Io(message) => AppError::Transport(message),
            HttpError::Decode(message) => AppError::Transport(format!("Unexpected response: {}", message)),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct ErrorBody {
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::Internal(message) => {
                tracing::error!("{}", message);
                "Internal server error".to_string()
            }
            other => {
                if status.is_server_error() {
                    tracing::warn!("{}", other);
                }
                other.to_string()
            }
        };
        (status, Json(ErrorBody { message })).into_response()
    }
}
