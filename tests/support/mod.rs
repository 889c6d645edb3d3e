//! In-process fake of the remote store plus a running stepboard service
//! pointed at it.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use stepboard::api::{build_api, AppState};
use stepboard::cache::Caches;
use stepboard::checklist::ChecklistRule;
use stepboard::http::ApiClient;
use stepboard::session::service::SessionStore;
use stepboard::status::classify::Classifier;
use stepboard::store::RemoteStore;
use stepboard::time::display_offset;
use tempfile::TempDir;

pub const CHECKLIST_STEP: i64 = 3;
pub const DASHBOARD_ORIGIN: &str = "http://localhost:5173";

#[derive(Default)]
pub struct FakeData {
    pub units: Vec<Value>,
    pub steps: Vec<Value>,
    pub assignments: Vec<Value>,
    pub results: Vec<Value>,
    pub notifications: Vec<Value>,
    pub uploaded: Vec<String>,
    pub patched: Vec<i64>,
    /// Unit ids whose details endpoint answers 500.
    pub broken_units: HashSet<String>,
    /// Assignment ids whose PATCH answers 409.
    pub locked_assignments: HashSet<i64>,
}

#[derive(Clone, Default)]
pub struct Fake {
    pub data: Arc<Mutex<FakeData>>,
    pub requests: Arc<AtomicUsize>,
}

impl Fake {
    pub fn seeded() -> Self {
        let fake = Fake::default();
        {
            let mut data = fake.data.lock().unwrap();
            data.steps = vec![
                json!({"id": 2, "name": "Burn-in", "order": 2}),
                json!({"id": 1, "name": "Visual", "order": 1}),
                json!({"id": 3, "name": "Thermal", "order": 3}),
            ];
            data.units = vec![
                json!({"id": "U1", "status": "IN_PROGRESS", "sku": "SKU-9"}),
                json!({"id": "U2", "status": null}),
            ];
            data.assignments = vec![
                json!({"id": 11, "unit_id": "U1", "step_id": 1, "tester_id": "ana",
                       "start_at": "2024-05-01", "end_at": "2024-05-02", "status": "PENDING"}),
                json!({"id": 12, "unit_id": "U1", "step_id": 2, "tester_id": "ana",
                       "start_at": "1970-01-01T00:00:00", "status": "PENDING"}),
                json!({"id": 13, "unit_id": "U1", "step_id": 3, "tester_id": "ana",
                       "start_at": "2024-05-03", "status": "PENDING",
                       "sub_checks": {"ambient": true, "low": true, "high": false}}),
                json!({"id": 21, "unit_id": "U2", "step_id": 1, "tester_id": "bo",
                       "status": "PENDING"}),
            ];
            data.results = vec![json!({
                "id": 100, "unit_id": "U1", "step_id": 1, "passed": true,
                "metrics": {}, "files": [], "finished_at": "2024-05-01T20:30:00"
            })];
            data.notifications = vec![
                json!({"id": 1, "message": "U1 ready", "read": false}),
                json!({"id": 2, "message": "U2 ready", "read": true}),
            ];
        }
        fake
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub async fn serve(&self) -> SocketAddr {
        let router = Router::new()
            .route("/auth/login", post(login))
            .route("/units", get(list_units).post(create_unit))
            .route("/units/:id", get(get_unit).patch(rename_unit).delete(delete_unit))
            .route("/units/:id/duplicate", post(duplicate))
            .route("/steps", get(list_steps))
            .route("/assignments", get(list_assignments))
            .route("/assignments/:id", patch(patch_assignment))
            .route("/results", post(create_result))
            .route("/results/:id/files", post(upload_file))
            .route("/notifications", get(list_notifications))
            .route("/notifications/:id/read", post(mark_read))
            .route("/export/units/:id/traveller", get(traveller))
            .route("/export/traveller", post(bulk_traveller))
            .with_state(self.clone());
        spawn(router).await
    }
}

async fn spawn(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

fn count(fake: &Fake) {
    fake.requests.fetch_add(1, Ordering::SeqCst);
}

fn rejected(status: StatusCode, detail: &str) -> Response {
    (status, Json(json!({ "detail": detail }))).into_response()
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Bearer tok-"))
}

async fn login(State(fake): State<Fake>, Json(body): Json<Value>) -> Response {
    count(&fake);
    let name = body["name"].as_str().unwrap_or_default().to_string();
    let role = if name.starts_with("sup") { "Supervisor" } else { "tester" };
    Json(json!({
        "token": format!("tok-{}", name),
        "role": role,
        "user": {"id": name, "name": name.to_uppercase()}
    }))
    .into_response()
}

async fn list_units(State(fake): State<Fake>, headers: HeaderMap) -> Response {
    count(&fake);
    if !authorized(&headers) {
        return rejected(StatusCode::UNAUTHORIZED, "Missing token");
    }
    Json(fake.data.lock().unwrap().units.clone()).into_response()
}

async fn create_unit(State(fake): State<Fake>, Json(body): Json<Value>) -> Response {
    count(&fake);
    let mut data = fake.data.lock().unwrap();
    let id = body["id"].as_str().unwrap_or_default().to_string();
    if data.units.iter().any(|u| u["id"] == id) {
        return rejected(StatusCode::CONFLICT, &format!("Unit {} already exists", id));
    }
    let unit = json!({"id": id, "status": "PENDING", "sku": body["sku"], "lot": body["lot"]});
    data.units.push(unit.clone());
    Json(unit).into_response()
}

async fn get_unit(State(fake): State<Fake>, Path(id): Path<String>) -> Response {
    count(&fake);
    let data = fake.data.lock().unwrap();
    if data.broken_units.contains(&id) {
        return rejected(StatusCode::INTERNAL_SERVER_ERROR, "database timeout");
    }
    let Some(unit) = data.units.iter().find(|u| u["id"] == id).cloned() else {
        return rejected(StatusCode::NOT_FOUND, &format!("Unit {} not found", id));
    };
    let of_unit = |items: &Vec<Value>| -> Vec<Value> {
        items.iter().filter(|i| i["unit_id"] == id).cloned().collect()
    };
    Json(json!({
        "unit": unit,
        "assignments": of_unit(&data.assignments),
        "results": of_unit(&data.results),
    }))
    .into_response()
}

async fn rename_unit(
    State(fake): State<Fake>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    count(&fake);
    let mut guard = fake.data.lock().unwrap();
    let data = &mut *guard;
    let new_id = body["new_id"].clone();
    let Some(unit) = data.units.iter_mut().find(|u| u["id"] == id) else {
        return rejected(StatusCode::NOT_FOUND, &format!("Unit {} not found", id));
    };
    unit["id"] = new_id.clone();
    let renamed = unit.clone();
    for item in data.assignments.iter_mut().chain(data.results.iter_mut()) {
        if item["unit_id"] == id {
            item["unit_id"] = new_id.clone();
        }
    }
    Json(renamed).into_response()
}

async fn delete_unit(State(fake): State<Fake>, Path(id): Path<String>) -> StatusCode {
    count(&fake);
    let mut data = fake.data.lock().unwrap();
    data.units.retain(|u| u["id"] != id);
    data.assignments.retain(|a| a["unit_id"] != id);
    data.results.retain(|r| r["unit_id"] != id);
    StatusCode::NO_CONTENT
}

async fn duplicate(
    State(fake): State<Fake>,
    Path(_id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    count(&fake);
    let mut data = fake.data.lock().unwrap();
    let mut created = vec![];
    for new_id in body["new_unit_ids"].as_array().cloned().unwrap_or_default() {
        let unit = json!({"id": new_id, "status": "PENDING"});
        data.units.push(unit.clone());
        created.push(unit);
    }
    Json(created).into_response()
}

async fn list_steps(State(fake): State<Fake>) -> Response {
    count(&fake);
    Json(fake.data.lock().unwrap().steps.clone()).into_response()
}

async fn list_assignments(
    State(fake): State<Fake>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    count(&fake);
    let data = fake.data.lock().unwrap();
    let matches = |a: &&Value| {
        params.get("unit_id").map_or(true, |u| a["unit_id"] == *u)
            && params.get("tester_id").map_or(true, |t| a["tester_id"] == *t)
    };
    let found: Vec<Value> = data.assignments.iter().filter(matches).cloned().collect();
    Json(found).into_response()
}

async fn patch_assignment(
    State(fake): State<Fake>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    count(&fake);
    let mut data = fake.data.lock().unwrap();
    if data.locked_assignments.contains(&id) {
        return rejected(StatusCode::CONFLICT, &format!("Assignment {} is locked", id));
    }
    data.patched.push(id);
    let Some(assignment) = data.assignments.iter_mut().find(|a| a["id"] == id) else {
        return rejected(StatusCode::NOT_FOUND, "Assignment not found");
    };
    if let (Some(target), Some(changes)) = (assignment.as_object_mut(), body.as_object()) {
        for (key, value) in changes {
            target.insert(key.clone(), value.clone());
        }
    }
    Json(assignment.clone()).into_response()
}

async fn create_result(State(fake): State<Fake>, Json(body): Json<Value>) -> Response {
    count(&fake);
    let mut data = fake.data.lock().unwrap();
    let id = 100 + data.results.len() as i64;
    let result = json!({
        "id": id,
        "unit_id": body["unit_id"],
        "step_id": body["step_id"],
        "passed": body["passed"],
        "metrics": body["metrics"],
        "files": [],
        "finished_at": body.get("finished_at").cloned().unwrap_or(json!("2024-05-04T01:00:00")),
    });
    data.results.push(result.clone());
    Json(result).into_response()
}

async fn upload_file(
    State(fake): State<Fake>,
    Path(_id): Path<i64>,
    mut multipart: Multipart,
) -> Response {
    count(&fake);
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.file_name().unwrap_or_default().to_string();
        if name.contains("huge") {
            return rejected(StatusCode::PAYLOAD_TOO_LARGE, &format!("{} is too large", name));
        }
        fake.data.lock().unwrap().uploaded.push(name);
    }
    StatusCode::CREATED.into_response()
}

async fn list_notifications(State(fake): State<Fake>) -> Response {
    count(&fake);
    Json(fake.data.lock().unwrap().notifications.clone()).into_response()
}

async fn mark_read(State(fake): State<Fake>, Path(id): Path<i64>) -> StatusCode {
    count(&fake);
    let mut data = fake.data.lock().unwrap();
    for notification in data.notifications.iter_mut() {
        if notification["id"] == id {
            notification["read"] = json!(true);
        }
    }
    StatusCode::NO_CONTENT
}

async fn traveller(State(fake): State<Fake>, Path(id): Path<String>) -> Response {
    count(&fake);
    (
        [(CONTENT_TYPE, "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet")],
        format!("traveller of {}", id).into_bytes(),
    )
        .into_response()
}

async fn bulk_traveller(State(fake): State<Fake>, Json(body): Json<Value>) -> Response {
    count(&fake);
    format!("{} travellers", body["unit_ids"].as_array().map_or(0, Vec::len)).into_response()
}

/// A stepboard service wired to a fake remote store.
pub struct Harness {
    pub fake: Fake,
    pub base: String,
    pub http: reqwest::Client,
    _session_dir: TempDir,
}

impl Harness {
    pub async fn start() -> Self {
        Self::start_with(Fake::seeded()).await
    }

    pub async fn start_with(fake: Fake) -> Self {
        let remote = fake.serve().await;
        let client = ApiClient::new(&format!("http://{}", remote), Duration::from_secs(5)).unwrap();
        let session_dir = tempfile::tempdir().unwrap();
        let state = AppState::new(
            RemoteStore::new(client),
            Arc::new(SessionStore::new(session_dir.path().join("session.json"))),
            Arc::new(Caches::new()),
            Classifier::new(display_offset(8)),
            ChecklistRule::new(Some(CHECKLIST_STEP)),
        );
        let origins = vec![HeaderValue::from_static(DASHBOARD_ORIGIN)];
        let addr = spawn(build_api(state, origins)).await;
        Harness {
            fake,
            base: format!("http://{}", addr),
            http: reqwest::Client::new(),
            _session_dir: session_dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub async fn login(&self, name: &str) {
        let response = self
            .http
            .post(self.url("/session/login"))
            .json(&json!({ "name": name }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200, "login as {}", name);
    }

    pub async fn get(&self, path: &str) -> (u16, Value) {
        let response = self.http.get(self.url(path)).send().await.unwrap();
        read(response).await
    }

    pub async fn send(&self, method: reqwest::Method, path: &str, body: Value) -> (u16, Value) {
        let response = self
            .http
            .request(method, self.url(path))
            .json(&body)
            .send()
            .await
            .unwrap();
        read(response).await
    }
}

async fn read(response: reqwest::Response) -> (u16, Value) {
    let status = response.status().as_u16();
    let text = response.text().await.unwrap();
    let body = if text.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap_or(Value::String(text))
    };
    (status, body)
}
