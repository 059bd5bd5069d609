// Bearer token attachment

use async_trait::async_trait;
use std::sync::Arc;

use super::{Attempt, Next, Outcome, Stage};
use crate::auth::store::read_token;
use crate::auth::{CredentialKeys, CredentialStore};

/// Attaches `Authorization: Bearer <access token>` from the credential store.
///
/// The store is read on every dispatch. Requests that already carry an
/// `Authorization` header (the post-refresh replay) are left alone, and a
/// missing token sends the request unauthenticated.
pub struct AttachBearer {
    store: Arc<dyn CredentialStore>,
    keys: CredentialKeys,
}

impl AttachBearer {
    pub fn new(store: Arc<dyn CredentialStore>, keys: CredentialKeys) -> Self {
        Self { store, keys }
    }
}

#[async_trait]
impl Stage for AttachBearer {
    async fn handle(&self, mut attempt: Attempt, next: Next<'_>) -> Outcome {
        if !attempt.request.has_authorization() {
            if let Some(token) = read_token(self.store.as_ref(), self.keys.access_token) {
                attempt.request = attempt.request.with_bearer(&token);
            }
        }

        next.run(attempt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryCredentialStore;
    use crate::http_client::ApiRequest;
    use crate::pipeline::Pipeline;
    use crate::testing::{json_response, RecordingTransport};
    use serde_json::json;

    fn pipeline(store: Arc<MemoryCredentialStore>) -> (Pipeline, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport::new(|_| {
            Ok(json_response(200, json!({})))
        }));
        let pipeline = Pipeline::new(transport.clone())
            .with_stage(AttachBearer::new(store, CredentialKeys::camel_case()));
        (pipeline, transport)
    }

    #[tokio::test]
    async fn test_attaches_stored_token() {
        let store = Arc::new(MemoryCredentialStore::new());
        store.set("accessToken", "a1").unwrap();
        let (pipeline, transport) = pipeline(store);

        pipeline.dispatch(ApiRequest::get("/api/v1/columns")).await;
        assert_eq!(transport.sent()[0].bearer(), Some("a1"));
    }

    #[tokio::test]
    async fn test_rereads_store_every_request() {
        let store = Arc::new(MemoryCredentialStore::new());
        store.set("accessToken", "a1").unwrap();
        let (pipeline, transport) = pipeline(store.clone());

        pipeline.dispatch(ApiRequest::get("/api/v1/columns")).await;
        store.set("accessToken", "a2").unwrap();
        pipeline.dispatch(ApiRequest::get("/api/v1/columns")).await;

        let sent = transport.sent();
        assert_eq!(sent[0].bearer(), Some("a1"));
        assert_eq!(sent[1].bearer(), Some("a2"));
    }

    #[tokio::test]
    async fn test_missing_token_sends_unauthenticated() {
        let store = Arc::new(MemoryCredentialStore::new());
        let (pipeline, transport) = pipeline(store);

        let outcome = pipeline.dispatch(ApiRequest::get("/api/v1/portfolios")).await;
        assert!(matches!(outcome, Outcome::Success(_)));
        assert!(!transport.sent()[0].has_authorization());
    }

    #[tokio::test]
    async fn test_keeps_existing_authorization() {
        let store = Arc::new(MemoryCredentialStore::new());
        store.set("accessToken", "stale").unwrap();
        let (pipeline, transport) = pipeline(store);

        pipeline
            .dispatch(ApiRequest::get("/api/v1/reviews").with_bearer("fresh"))
            .await;
        assert_eq!(transport.sent()[0].bearer(), Some("fresh"));
    }
}
