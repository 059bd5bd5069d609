// Request pipeline
// Ordered stages wrapped around the transport: each stage receives the
// attempt and a handle to the rest of the chain

pub mod auth;
pub mod logging;
pub mod refresh;

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::{ClientError, RefreshError, TransportError};
use crate::http_client::{ApiRequest, ApiResponse, Transport};

pub use auth::AttachBearer;
pub use logging::RequestLog;
pub use refresh::RefreshOnUnauthorized;

/// Which dispatch of an original request this is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptKind {
    /// First dispatch
    Original,
    /// The single replay after a successful refresh
    Replay,
}

/// A request together with its attempt number
#[derive(Debug, Clone)]
pub struct Attempt {
    pub request: ApiRequest,
    pub kind: AttemptKind,
}

impl Attempt {
    pub fn original(request: ApiRequest) -> Self {
        Self {
            request,
            kind: AttemptKind::Original,
        }
    }

    pub fn replay(request: ApiRequest) -> Self {
        Self {
            request,
            kind: AttemptKind::Replay,
        }
    }

    pub fn is_replay(&self) -> bool {
        self.kind == AttemptKind::Replay
    }
}

/// Terminal result of running a request through the pipeline
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Any response other than 401, passed through unchanged
    Success(ApiResponse),

    /// No response at all
    NetworkFailure(TransportError),

    /// 401 response. `rejected_token` is the bearer the request carried.
    Unauthorized {
        response: ApiResponse,
        attempt: AttemptKind,
        rejected_token: Option<String>,
    },

    /// Session could not be recovered; credentials are already cleared
    RefreshFailed(RefreshError),
}

impl Outcome {
    /// Classify what the transport returned for `attempt`
    fn from_transport(attempt: &Attempt, result: Result<ApiResponse, TransportError>) -> Self {
        match result {
            Ok(response) if response.status() == reqwest::StatusCode::UNAUTHORIZED => {
                Outcome::Unauthorized {
                    response,
                    attempt: attempt.kind,
                    rejected_token: attempt.request.bearer().map(str::to_string),
                }
            }
            Ok(response) => Outcome::Success(response),
            Err(e) => Outcome::NetworkFailure(e),
        }
    }

    /// Collapse into the caller-facing result
    pub fn into_result(self) -> Result<ApiResponse, ClientError> {
        match self {
            Outcome::Success(response) => Ok(response),
            Outcome::NetworkFailure(e) => Err(ClientError::Network(e)),
            Outcome::Unauthorized { response, .. } => Err(ClientError::Unauthorized {
                message: response.error_message(),
            }),
            Outcome::RefreshFailed(e) => Err(ClientError::RefreshFailed(e)),
        }
    }
}

/// One stage of the pipeline
#[async_trait]
pub trait Stage: Send + Sync {
    async fn handle(&self, attempt: Attempt, next: Next<'_>) -> Outcome;
}

/// The remainder of the pipeline after the current stage.
///
/// `Copy`, so a stage may run the rest of the chain more than once.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    stages: &'a [Arc<dyn Stage>],
    transport: &'a dyn Transport,
}

impl<'a> Next<'a> {
    pub async fn run(self, attempt: Attempt) -> Outcome {
        match self.stages.split_first() {
            Some((stage, rest)) => {
                let next = Next {
                    stages: rest,
                    transport: self.transport,
                };
                stage.handle(attempt, next).await
            }
            None => {
                let result = self.transport.send(&attempt.request).await;
                Outcome::from_transport(&attempt, result)
            }
        }
    }
}

/// Ordered stages in front of a transport
#[derive(Clone)]
pub struct Pipeline {
    stages: Vec<Arc<dyn Stage>>,
    transport: Arc<dyn Transport>,
}

impl Pipeline {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            stages: Vec::new(),
            transport,
        }
    }

    /// Append a stage; stages run in the order they were added
    pub fn with_stage<S: Stage + 'static>(mut self, stage: S) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Run a fresh request through every stage
    pub async fn dispatch(&self, request: ApiRequest) -> Outcome {
        let next = Next {
            stages: &self.stages,
            transport: self.transport.as_ref(),
        };
        next.run(Attempt::original(request)).await
    }
}
