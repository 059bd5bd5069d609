// HTTP transport for the studio API
// Request/response descriptors and the reqwest-backed transport

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use crate::error::TransportError;

/// Body of an outgoing request
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Multipart(Vec<FormPart>),
}

/// One field of a multipart form.
///
/// File parts own their bytes so a request can be replayed unchanged.
#[derive(Debug, Clone)]
pub struct FormPart {
    pub name: String,
    pub value: FormValue,
}

#[derive(Debug, Clone)]
pub enum FormValue {
    Text(String),
    File {
        file_name: String,
        mime: String,
        data: Bytes,
    },
}

impl FormPart {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: FormValue::Text(value.into()),
        }
    }

    pub fn file(
        name: impl Into<String>,
        file_name: impl Into<String>,
        mime: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            value: FormValue::File {
                file_name: file_name.into(),
                mime: mime.into(),
                data: data.into(),
            },
        }
    }
}

/// Outgoing request descriptor.
///
/// Built once by the caller and never mutated in place: pipeline stages
/// derive modified copies (e.g. with an `Authorization` header).
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: RequestBody,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn with_json<T: Serialize>(mut self, body: &T) -> Result<Self, serde_json::Error> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn with_multipart(mut self, parts: Vec<FormPart>) -> Self {
        self.body = RequestBody::Multipart(parts);
        self
    }

    /// Copy of this request carrying `Authorization: Bearer <token>`.
    /// A token that is not a valid header value leaves the request unchanged.
    pub fn with_bearer(mut self, token: &str) -> Self {
        match HeaderValue::from_str(&format!("Bearer {}", token)) {
            Ok(mut value) => {
                value.set_sensitive(true);
                self.headers.insert(AUTHORIZATION, value);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token is not a valid header value, sending without it");
            }
        }
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    /// Bearer token carried by this request, if any
    pub fn bearer(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
    }

    pub fn has_authorization(&self) -> bool {
        self.headers.contains_key(AUTHORIZATION)
    }
}

/// Fully buffered HTTP response
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Human-readable error message.
    ///
    /// Uses the backend's `detail` field when present (string, or the raw
    /// JSON of a validation error list), then the body text, then the
    /// canonical status reason.
    pub fn error_message(&self) -> String {
        if let Ok(value) = serde_json::from_slice::<serde_json::Value>(&self.body) {
            match value.get("detail") {
                Some(serde_json::Value::String(detail)) => return detail.clone(),
                Some(detail) if !detail.is_null() => return detail.to_string(),
                _ => {}
            }
        }

        let text = self.text();
        if !text.trim().is_empty() {
            return text;
        }

        self.status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string()
    }
}

/// Performs the actual network call for a request descriptor
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// reqwest-backed transport with connection pooling and timeouts
pub struct ReqwestTransport {
    /// Shared HTTP client with connection pooling
    client: Client,

    /// API origin, without trailing slash
    base_url: String,
}

impl ReqwestTransport {
    /// Create a new transport
    pub fn new(base_url: &str, connect_timeout: u64, request_timeout: u64) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout))
            .timeout(Duration::from_secs(request_timeout))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute paths are used as-is, relative ones are joined to the base URL
    fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }

    fn build_form(parts: &[FormPart]) -> Result<reqwest::multipart::Form, TransportError> {
        let mut form = reqwest::multipart::Form::new();
        for part in parts {
            form = match &part.value {
                FormValue::Text(text) => form.text(part.name.clone(), text.clone()),
                FormValue::File {
                    file_name,
                    mime,
                    data,
                } => {
                    let file = reqwest::multipart::Part::bytes(data.to_vec())
                        .file_name(file_name.clone())
                        .mime_str(mime)
                        .map_err(|e| TransportError::Request(e.to_string()))?;
                    form.part(part.name.clone(), file)
                }
            };
        }
        Ok(form)
    }
}

/// Categorize a reqwest error the same way for requests and body reads
fn classify(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout(e.to_string())
    } else if e.is_connect() {
        TransportError::Connect(e.to_string())
    } else {
        TransportError::Request(e.to_string())
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = self.url_for(request.path());

        let mut builder = self
            .client
            .request(request.method().clone(), &url)
            .headers(request.headers().clone());

        if !request.query().is_empty() {
            builder = builder.query(request.query());
        }

        builder = match request.body() {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart(parts) => builder.multipart(Self::build_form(parts)?),
        };

        let response = builder.send().await.map_err(classify)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(classify)?;

        Ok(ApiResponse::new(status, body).with_headers(headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_with_bearer_sets_header() {
        let request = ApiRequest::get("/api/v1/portfolios").with_bearer("abc.def");
        assert_eq!(request.bearer(), Some("abc.def"));
        assert!(request.has_authorization());
    }

    #[test]
    fn test_with_bearer_rejects_invalid_token() {
        let request = ApiRequest::get("/api/v1/portfolios").with_bearer("bad\ntoken");
        assert_eq!(request.bearer(), None);
    }

    #[test]
    fn test_with_bearer_does_not_touch_original() {
        let original = ApiRequest::get("/api/v1/columns");
        let authed = original.clone().with_bearer("t1");
        assert!(!original.has_authorization());
        assert_eq!(authed.bearer(), Some("t1"));
    }

    #[test]
    fn test_query_and_json_body() {
        let request = ApiRequest::post("/api/v1/auth/login")
            .with_query("page", 2)
            .with_json(&json!({"email": "a@b.c"}))
            .unwrap();
        assert_eq!(request.query(), &[("page".to_string(), "2".to_string())]);
        assert!(matches!(request.body(), RequestBody::Json(v) if v["email"] == "a@b.c"));
    }

    #[test]
    fn test_error_message_prefers_detail() {
        let response = ApiResponse::new(
            StatusCode::NOT_FOUND,
            r#"{"detail":"Review not found"}"#,
        );
        assert_eq!(response.error_message(), "Review not found");
    }

    #[test]
    fn test_error_message_validation_list() {
        let response = ApiResponse::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"detail":[{"loc":["body","title"],"msg":"field required"}]}"#,
        );
        assert!(response.error_message().contains("field required"));
    }

    #[test]
    fn test_error_message_fallbacks() {
        let response = ApiResponse::new(StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(response.error_message(), "upstream down");

        let response = ApiResponse::new(StatusCode::SERVICE_UNAVAILABLE, "");
        assert_eq!(response.error_message(), "Service Unavailable");
    }

    #[test]
    fn test_url_for() {
        let transport = ReqwestTransport::new("http://localhost:8000/", 5, 5).unwrap();
        assert_eq!(transport.base_url(), "http://localhost:8000");
        assert_eq!(
            transport.url_for("/api/v1/reviews"),
            "http://localhost:8000/api/v1/reviews"
        );
        assert_eq!(
            transport.url_for("https://cdn.example.com/a.png"),
            "https://cdn.example.com/a.png"
        );
    }

    #[test]
    fn test_build_form_rejects_bad_mime() {
        let parts = vec![FormPart::file("image", "a.png", "not a mime", vec![1u8, 2, 3])];
        assert!(ReqwestTransport::build_form(&parts).is_err());
    }
}
