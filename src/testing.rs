// Test doubles for the transport and redirect collaborators
// Available in test builds and with the `test-utils` feature

use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::auth::LoginRedirect;
use crate::error::TransportError;
use crate::http_client::{ApiRequest, ApiResponse, Transport};

type Responder = dyn Fn(&ApiRequest) -> Result<ApiResponse, TransportError> + Send + Sync;

/// Transport that answers from a closure and records every request it sees
pub struct RecordingTransport {
    responder: Box<Responder>,
    delays: HashMap<String, Duration>,
    sent: Mutex<Vec<ApiRequest>>,
}

impl RecordingTransport {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&ApiRequest) -> Result<ApiResponse, TransportError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            delays: HashMap::new(),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Delay responses for `path`
    pub fn with_delay(mut self, path: &str, delay: Duration) -> Self {
        self.delays.insert(path.to_string(), delay);
        self
    }

    /// Every request sent so far, in order
    pub fn sent(&self) -> Vec<ApiRequest> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Number of requests sent to `path`
    pub fn count(&self, path: &str) -> usize {
        self.sent().iter().filter(|r| r.path() == path).count()
    }

    /// Requests sent to `path`, in order
    pub fn sent_to(&self, path: &str) -> Vec<ApiRequest> {
        self.sent()
            .into_iter()
            .filter(|r| r.path() == path)
            .collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(request.clone());
        }

        if let Some(delay) = self.delays.get(request.path()) {
            tokio::time::sleep(*delay).await;
        }

        (self.responder)(request)
    }
}

/// JSON response helper
pub fn json_response(status: u16, body: serde_json::Value) -> ApiResponse {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    ApiResponse::new(status, body.to_string())
}

/// Redirect that counts invocations and remembers the last path
#[derive(Default)]
pub struct RecordingRedirect {
    calls: AtomicUsize,
    last_path: Mutex<Option<String>>,
}

impl RecordingRedirect {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_path(&self) -> Option<String> {
        self.last_path.lock().ok().and_then(|p| p.clone())
    }
}

impl LoginRedirect for RecordingRedirect {
    fn redirect_to_login(&self, login_path: &str) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_path.lock() {
            *last = Some(login_path.to_string());
        }
    }
}
