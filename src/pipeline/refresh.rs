// Refresh-and-replay on 401

use async_trait::async_trait;
use std::sync::Arc;

use super::{Attempt, AttemptKind, Next, Outcome, Stage};
use crate::auth::RefreshCoordinator;

/// Recovers from an expired access token.
///
/// An original attempt that comes back 401 triggers one refresh through the
/// coordinator and one replay carrying the new token. A replay that comes
/// back 401 is returned as is, so a request is dispatched at most twice.
pub struct RefreshOnUnauthorized {
    coordinator: Arc<RefreshCoordinator>,
}

impl RefreshOnUnauthorized {
    pub fn new(coordinator: Arc<RefreshCoordinator>) -> Self {
        Self { coordinator }
    }
}

#[async_trait]
impl Stage for RefreshOnUnauthorized {
    async fn handle(&self, attempt: Attempt, next: Next<'_>) -> Outcome {
        // Kept before the bearer is attached; the replay is built from this
        // copy. Bodies are `Bytes`-backed, so the clone does not copy payloads.
        let request = attempt.request.clone();

        match next.run(attempt).await {
            Outcome::Unauthorized {
                attempt: AttemptKind::Original,
                rejected_token,
                ..
            } => {
                tracing::warn!(
                    method = %request.method(),
                    path = request.path(),
                    "Received 401, refreshing token and retrying..."
                );

                match self.coordinator.recover(rejected_token.as_deref()).await {
                    Ok(access_token) => {
                        next.run(Attempt::replay(request.with_bearer(&access_token)))
                            .await
                    }
                    Err(e) => Outcome::RefreshFailed(e),
                }
            }
            outcome => outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{
        CredentialKeys, CredentialStore, MemoryCredentialStore, RefreshStyle, REFRESH_ENDPOINT,
    };
    use crate::error::{RefreshError, TransportError};
    use crate::http_client::ApiRequest;
    use crate::pipeline::{AttachBearer, Pipeline};
    use crate::testing::{json_response, RecordingRedirect, RecordingTransport};
    use serde_json::json;
    use std::time::Duration;

    const PORTFOLIOS: &str = "/api/v1/portfolios";

    struct Harness {
        pipeline: Pipeline,
        transport: Arc<RecordingTransport>,
        store: Arc<MemoryCredentialStore>,
        redirect: Arc<RecordingRedirect>,
    }

    fn harness(transport: RecordingTransport, store: MemoryCredentialStore) -> Harness {
        let transport = Arc::new(transport);
        let store = Arc::new(store);
        let redirect = RecordingRedirect::new();
        let keys = CredentialKeys::camel_case();

        let coordinator = Arc::new(RefreshCoordinator::new(
            transport.clone(),
            store.clone(),
            redirect.clone(),
            keys,
            RefreshStyle::BearerHeader,
            "/admin/login",
        ));

        let pipeline = Pipeline::new(transport.clone())
            .with_stage(RefreshOnUnauthorized::new(coordinator))
            .with_stage(AttachBearer::new(store.clone(), keys));

        Harness {
            pipeline,
            transport,
            store,
            redirect,
        }
    }

    /// Backend that accepts only `valid` as access token and rotates on refresh
    fn backend(valid: &'static str, refresh_status: u16) -> RecordingTransport {
        RecordingTransport::new(move |request| {
            if request.path() == REFRESH_ENDPOINT {
                return Ok(if refresh_status == 200 {
                    json_response(200, json!({"access_token": valid, "refresh_token": "r2"}))
                } else {
                    json_response(refresh_status, json!({"detail": "Invalid refresh token"}))
                });
            }
            if request.bearer() == Some(valid) {
                Ok(json_response(200, json!({"items": []})))
            } else {
                Ok(json_response(401, json!({"detail": "Could not validate credentials"})))
            }
        })
    }

    fn tokens(access: &str, refresh: &str) -> MemoryCredentialStore {
        MemoryCredentialStore::with_tokens(CredentialKeys::camel_case(), access, refresh)
    }

    #[tokio::test]
    async fn test_success_dispatches_once() {
        let h = harness(backend("a1", 200), tokens("a1", "r1"));

        let outcome = h.pipeline.dispatch(ApiRequest::get(PORTFOLIOS)).await;
        assert!(matches!(outcome, Outcome::Success(r) if r.status() == 200));
        assert_eq!(h.transport.sent().len(), 1);
        assert_eq!(h.transport.count(REFRESH_ENDPOINT), 0);
    }

    #[tokio::test]
    async fn test_non_401_errors_pass_through() {
        let transport = RecordingTransport::new(|_| {
            Ok(json_response(422, json!({"detail": "title required"})))
        });
        let h = harness(transport, tokens("a1", "r1"));

        let outcome = h.pipeline.dispatch(ApiRequest::post(PORTFOLIOS)).await;
        assert!(matches!(outcome, Outcome::Success(r) if r.status() == 422));
        assert_eq!(h.transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_expired_token_refreshes_and_replays_once() {
        let h = harness(backend("a2", 200), tokens("a1", "r1"));

        let outcome = h.pipeline.dispatch(ApiRequest::get(PORTFOLIOS)).await;
        assert!(matches!(outcome, Outcome::Success(r) if r.status() == 200));

        let calls = h.transport.sent_to(PORTFOLIOS);
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].bearer(), Some("a1"));
        assert_eq!(calls[1].bearer(), Some("a2"));

        let refreshes = h.transport.sent_to(REFRESH_ENDPOINT);
        assert_eq!(refreshes.len(), 1);
        assert_eq!(refreshes[0].bearer(), Some("r1"));

        assert_eq!(h.store.get("accessToken").unwrap().as_deref(), Some("a2"));
        assert_eq!(h.store.get("refreshToken").unwrap().as_deref(), Some("r2"));
        assert_eq!(h.redirect.calls(), 0);
    }

    #[tokio::test]
    async fn test_replay_401_is_not_refreshed_again() {
        // Refresh "succeeds" but the backend still rejects the new token
        let transport = RecordingTransport::new(|request| {
            if request.path() == REFRESH_ENDPOINT {
                Ok(json_response(200, json!({"access_token": "a2"})))
            } else {
                Ok(json_response(401, json!({"detail": "revoked"})))
            }
        });
        let h = harness(transport, tokens("a1", "r1"));

        let outcome = h.pipeline.dispatch(ApiRequest::get(PORTFOLIOS)).await;
        match outcome {
            Outcome::Unauthorized { attempt, .. } => assert_eq!(attempt, AttemptKind::Replay),
            other => panic!("expected Unauthorized, got {:?}", other),
        }
        assert_eq!(h.transport.count(PORTFOLIOS), 2);
        assert_eq!(h.transport.count(REFRESH_ENDPOINT), 1);
        assert_eq!(h.redirect.calls(), 0);
    }

    #[tokio::test]
    async fn test_refresh_rejected_clears_and_redirects() {
        let h = harness(backend("a2", 401), tokens("a1", "r1"));

        let outcome = h.pipeline.dispatch(ApiRequest::get(PORTFOLIOS)).await;
        match outcome {
            Outcome::RefreshFailed(RefreshError::Rejected { status, .. }) => {
                assert_eq!(status, 401)
            }
            other => panic!("expected RefreshFailed, got {:?}", other),
        }

        assert_eq!(h.transport.count(PORTFOLIOS), 1);
        assert_eq!(h.store.get("accessToken").unwrap(), None);
        assert_eq!(h.store.get("refreshToken").unwrap(), None);
        assert_eq!(h.redirect.calls(), 1);
        assert_eq!(h.redirect.last_path().as_deref(), Some("/admin/login"));
    }

    #[tokio::test]
    async fn test_missing_refresh_token_fails_without_refresh_call() {
        let store = MemoryCredentialStore::new();
        store.set("accessToken", "a1").unwrap();
        let h = harness(backend("a2", 200), store);

        let outcome = h.pipeline.dispatch(ApiRequest::get(PORTFOLIOS)).await;
        assert!(matches!(
            outcome,
            Outcome::RefreshFailed(RefreshError::MissingRefreshToken)
        ));
        assert_eq!(h.transport.count(REFRESH_ENDPOINT), 0);
        assert_eq!(h.store.get("accessToken").unwrap(), None);
        assert_eq!(h.redirect.calls(), 1);
    }

    #[tokio::test]
    async fn test_network_failure_skips_refresh() {
        let transport =
            RecordingTransport::new(|_| Err(TransportError::Connect("refused".to_string())));
        let h = harness(transport, tokens("a1", "r1"));

        let outcome = h.pipeline.dispatch(ApiRequest::get(PORTFOLIOS)).await;
        assert!(matches!(outcome, Outcome::NetworkFailure(_)));
        assert_eq!(h.transport.sent().len(), 1);
        assert_eq!(h.store.get("accessToken").unwrap().as_deref(), Some("a1"));
        assert_eq!(h.store.get("refreshToken").unwrap().as_deref(), Some("r1"));
        assert_eq!(h.redirect.calls(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_401s_share_one_refresh() {
        let transport = backend("a2", 200).with_delay(REFRESH_ENDPOINT, Duration::from_millis(50));
        let h = harness(transport, tokens("a1", "r1"));

        let (first, second, third) = tokio::join!(
            h.pipeline.dispatch(ApiRequest::get(PORTFOLIOS)),
            h.pipeline.dispatch(ApiRequest::get("/api/v1/columns")),
            h.pipeline.dispatch(ApiRequest::get("/api/v1/reviews")),
        );

        for outcome in [first, second, third] {
            assert!(matches!(outcome, Outcome::Success(r) if r.status() == 200));
        }
        assert_eq!(h.transport.count(REFRESH_ENDPOINT), 1);
        // Each original request: one rejected dispatch plus one replay
        assert_eq!(h.transport.sent().len(), 7);
    }

    #[tokio::test]
    async fn test_stale_401_after_refresh_replays_without_refreshing() {
        let h = harness(backend("a2", 200), tokens("a1", "r1"));

        h.pipeline.dispatch(ApiRequest::get(PORTFOLIOS)).await;
        assert_eq!(h.transport.count(REFRESH_ENDPOINT), 1);

        // A request that was signed with the old token before the refresh landed
        let outcome = h
            .pipeline
            .dispatch(ApiRequest::get(PORTFOLIOS).with_bearer("a1"))
            .await;
        assert!(matches!(outcome, Outcome::Success(_)));
        assert_eq!(h.transport.count(REFRESH_ENDPOINT), 1);
    }
}
