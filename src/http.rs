use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::multipart::Form;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ReqParam {
    pub key: String,
    pub value: String,
}

impl ReqParam {
    pub fn new(key: String, value: String) -> Self {
        ReqParam { key, value }
    }
}

pub enum ReqBody {
    Empty,
    Json(Value),
    Multipart(Form),
}

/// Path segments are percent-encoded one by one, so unit ids containing `/`
/// or spaces stay a single segment.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub method: HttpMethod,
    pub segments: Vec<String>,
    pub query_params: Vec<ReqParam>,
}

impl Endpoint {
    pub fn new(method: HttpMethod, segments: &[&str]) -> Endpoint {
        Endpoint {
            method,
            segments: segments.iter().map(|s| s.to_string()).collect(),
            query_params: vec![],
        }
    }

    pub fn maybe_query(mut self, key: &str, value: Option<&str>) -> Endpoint {
        if let Some(value) = value {
            self.query_params
                .push(ReqParam::new(key.to_string(), value.to_string()));
        }
        self
    }

    pub fn to_url(&self, base: &Url) -> Result<Url, HttpError> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| HttpError::Io(format!("{} cannot be used as a base url", base)))?
            .pop_if_empty()
            .extend(&self.segments);
        if !self.query_params.is_empty() {
            url.query_pairs_mut().extend_pairs(
                self.query_params
                    .iter()
                    .map(|param| (param.key.as_str(), param.value.as_str())),
            );
        }
        Ok(url)
    }
}

pub struct HttpRequest {
    pub endpoint: Endpoint,
    pub req_body: ReqBody,
}

impl HttpRequest {
    pub fn new(endpoint: Endpoint) -> HttpRequest {
        HttpRequest {
            endpoint,
            req_body: ReqBody::Empty,
        }
    }

    pub fn json<T: Serialize>(endpoint: Endpoint, body: &T) -> Result<HttpRequest, HttpError> {
        let value = serde_json::to_value(body).map_err(|e| HttpError::Decode(e.to_string()))?;
        Ok(HttpRequest {
            endpoint,
            req_body: ReqBody::Json(value),
        })
    }

    pub fn multipart(endpoint: Endpoint, form: Form) -> HttpRequest {
        HttpRequest {
            endpoint,
            req_body: ReqBody::Multipart(form),
        }
    }
}

/// An opaque file handed back by the export endpoints.
#[derive(Debug, Clone)]
pub struct Download {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Debug, thiserror::Error)]
pub enum HttpError {
    #[error("{}", .1.message())]
    Status(u16, StatusError),
    #[error("{0}")]
    Io(String),
    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl HttpError {
    pub fn get_message(&self) -> String {
        self.to_string()
    }
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum StatusError {
    ClientError(String),
    ServerError(String),
}

impl StatusError {
    pub fn message(&self) -> &str {
        match self {
            StatusError::ClientError(msg) => msg,
            StatusError::ServerError(msg) => msg,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    POST,
    GET,
    PATCH,
    DELETE,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HttpMethod::POST => "POST",
            HttpMethod::GET => "GET",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::DELETE => "DELETE",
        };
        f.write_str(name)
    }
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, HttpError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| HttpError::Io(format!("invalid base url {}: {}", base_url, e)))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HttpError::Io(e.to_string()))?;
        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    /// Same connection pool, with a bearer token attached to every request.
    pub fn authorized(&self, token: &str) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token.to_string()),
        }
    }

    pub async fn execute<T: DeserializeOwned>(&self, request: HttpRequest) -> Result<T, HttpError> {
        let response = self.send(request).await?;
        let text = response
            .text()
            .await
            .map_err(|e| HttpError::Io(e.to_string()))?;
        if text.trim().is_empty() {
            return serde_json::from_value(Value::Null).map_err(|e| HttpError::Decode(e.to_string()));
        }
        serde_json::from_str(&text).map_err(|e| HttpError::Decode(e.to_string()))
    }

    pub async fn execute_empty(&self, request: HttpRequest) -> Result<(), HttpError> {
        self.send(request).await.map(|_| ())
    }

    pub async fn download(&self, request: HttpRequest) -> Result<Download, HttpError> {
        let response = self.send(request).await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| HttpError::Io(e.to_string()))?;
        Ok(Download {
            content_type,
            bytes: bytes.to_vec(),
        })
    }

    async fn send(&self, request: HttpRequest) -> Result<Response, HttpError> {
        let method = request.endpoint.method;
        let url = request.endpoint.to_url(&self.base_url)?;
        info!("will execute http request: {} {}", method, url.path());
        let req = self.build_reqwest(method, url, request.req_body)?;
        let response = req.send().await.map_err(|error| {
            warn!("http request failed: {}", error);
            HttpError::Io(error.to_string())
        })?;
        let status_code = response.status();
        info!("http request executed, status_code: {}", status_code);
        if status_code.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        let message = extract_message(status_code, &text);
        warn!("http request rejected: {} {}", status_code, message);
        if status_code.is_client_error() {
            Err(HttpError::Status(
                status_code.as_u16(),
                StatusError::ClientError(message),
            ))
        } else {
            Err(HttpError::Status(
                status_code.as_u16(),
                StatusError::ServerError(message),
            ))
        }
    }

    fn build_reqwest(
        &self,
        method: HttpMethod,
        url: Url,
        req_body: ReqBody,
    ) -> Result<RequestBuilder, HttpError> {
        let library_method = match method {
            HttpMethod::POST => Method::POST,
            HttpMethod::GET => Method::GET,
            HttpMethod::PATCH => Method::PATCH,
            HttpMethod::DELETE => Method::DELETE,
        };

        let mut req = self.client.request(library_method, url);
        if let Some(token) = &self.token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| HttpError::Io(format!("invalid token: {}", e)))?;
            req = req.header(AUTHORIZATION, value);
        }

        req = match req_body {
            ReqBody::Empty => req,
            ReqBody::Json(body) => {
                debug!("request body: {}", body);
                req.json(&body)
            }
            ReqBody::Multipart(form) => req.multipart(form),
        };
        Ok(req)
    }
}

/// Best-effort readable message from an error response body.
pub fn extract_message(status: StatusCode, body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        for key in ["detail", "message", "error"] {
            match map.get(key) {
                Some(Value::String(s)) if !s.trim().is_empty() => return s.clone(),
                Some(Value::Null) | None => {}
                Some(other) => return other.to_string(),
            }
        }
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    }
}
