// Request/response logging stage

use async_trait::async_trait;
use std::time::Instant;

use super::{Attempt, Next, Outcome, Stage};
use crate::config::DebugMode;
use crate::http_client::{ApiRequest, ApiResponse, FormValue, RequestBody};

/// Logs every dispatch that reaches the transport.
///
/// Bodies are logged at debug level depending on the mode:
/// - off: never
/// - errors: only for non-success outcomes
/// - all: always
///
/// Header values are never logged, so tokens stay out of the logs.
pub struct RequestLog {
    mode: DebugMode,
}

impl RequestLog {
    pub fn new(mode: DebugMode) -> Self {
        Self { mode }
    }

    fn log_bodies(&self, failed: bool) -> bool {
        match self.mode {
            DebugMode::Off => false,
            DebugMode::Errors => failed,
            DebugMode::All => true,
        }
    }
}

/// JSON fields whose values are masked in logs
const SECRET_FIELDS: &[&str] = &["password", "access_token", "refresh_token"];

/// Short description of a request body; file contents are summarized
fn describe_body(request: &ApiRequest) -> String {
    match request.body() {
        RequestBody::Empty => String::new(),
        RequestBody::Json(value) => {
            let mut value = value.clone();
            if let Some(object) = value.as_object_mut() {
                for field in SECRET_FIELDS {
                    if let Some(secret) = object.get_mut(*field) {
                        *secret = serde_json::Value::String("***".to_string());
                    }
                }
            }
            value.to_string()
        }
        RequestBody::Multipart(parts) => parts
            .iter()
            .map(|part| match &part.value {
                FormValue::Text(text) => format!("{}={}", part.name, text),
                FormValue::File {
                    file_name, data, ..
                } => format!("{}=<{} ({} bytes)>", part.name, file_name, data.len()),
            })
            .collect::<Vec<_>>()
            .join(", "),
    }
}

fn log_exchange(request: &ApiRequest, response: &ApiResponse) {
    tracing::debug!(
        method = %request.method(),
        path = request.path(),
        request_body = %describe_body(request),
        response_body = %response.text(),
        "HTTP exchange"
    );
}

#[async_trait]
impl Stage for RequestLog {
    async fn handle(&self, attempt: Attempt, next: Next<'_>) -> Outcome {
        let request = attempt.request.clone();
        let replay = attempt.is_replay();

        tracing::debug!(
            method = %request.method(),
            path = request.path(),
            replay = replay,
            authenticated = request.has_authorization(),
            "Sending HTTP request"
        );

        let started = Instant::now();
        let outcome = next.run(attempt).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &outcome {
            Outcome::Success(response) => {
                let status = response.status();
                if status.is_success() {
                    tracing::debug!(
                        status = status.as_u16(),
                        elapsed_ms = elapsed_ms,
                        "Request successful"
                    );
                } else {
                    tracing::warn!(
                        method = %request.method(),
                        path = request.path(),
                        status = status.as_u16(),
                        elapsed_ms = elapsed_ms,
                        "Received error response"
                    );
                }
                if self.log_bodies(!status.is_success()) {
                    log_exchange(&request, response);
                }
            }
            Outcome::Unauthorized { response, .. } => {
                tracing::warn!(
                    method = %request.method(),
                    path = request.path(),
                    replay = replay,
                    elapsed_ms = elapsed_ms,
                    "Received 401 Unauthorized"
                );
                if self.log_bodies(true) {
                    log_exchange(&request, response);
                }
            }
            Outcome::NetworkFailure(e) => {
                tracing::warn!(
                    error_kind = e.kind(),
                    error = %e,
                    method = %request.method(),
                    path = request.path(),
                    elapsed_ms = elapsed_ms,
                    "HTTP request error"
                );
            }
            Outcome::RefreshFailed(e) => {
                tracing::warn!(error = %e, path = request.path(), "Session could not be recovered");
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::FormPart;
    use serde_json::json;

    #[test]
    fn test_body_logging_modes() {
        assert!(!RequestLog::new(DebugMode::Off).log_bodies(true));
        assert!(RequestLog::new(DebugMode::Errors).log_bodies(true));
        assert!(!RequestLog::new(DebugMode::Errors).log_bodies(false));
        assert!(RequestLog::new(DebugMode::All).log_bodies(false));
    }

    #[test]
    fn test_describe_multipart_body_hides_file_contents() {
        let request = ApiRequest::post("/api/v1/portfolios").with_multipart(vec![
            FormPart::text("title", "Cafe logo"),
            FormPart::file("image", "logo.png", "image/png", vec![0u8; 2048]),
        ]);
        assert_eq!(
            describe_body(&request),
            "title=Cafe logo, image=<logo.png (2048 bytes)>"
        );
    }

    #[test]
    fn test_describe_json_body_masks_secrets() {
        let request = ApiRequest::post("/api/v1/auth/login")
            .with_json(&json!({"email": "admin@studio.kr", "password": "hunter2"}))
            .unwrap();
        let described = describe_body(&request);
        assert!(described.contains("admin@studio.kr"));
        assert!(described.contains("***"));
        assert!(!described.contains("hunter2"));
    }
}
