// Error handling module
// Defines the client error taxonomy surfaced to callers

use thiserror::Error;

/// Errors returned by the studio API client
#[derive(Error, Debug)]
pub enum ClientError {
    /// The server could not be reached at all (no HTTP response)
    #[error("Cannot reach the server: {0}")]
    Network(#[from] TransportError),

    /// 401 that survived the single refresh-and-replay
    #[error("Authentication failed: {message}")]
    Unauthorized { message: String },

    /// Token refresh failed; stored credentials were cleared and the login
    /// redirect has already been triggered
    #[error("Session expired: {0}")]
    RefreshFailed(#[from] RefreshError),

    /// Any other non-success response from the API
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Request rejected client-side before it was sent
    #[error("Validation error: {0}")]
    Validation(String),

    /// Login succeeded at the HTTP level but tokens were missing
    #[error("Login response did not contain both access and refresh tokens")]
    InvalidLoginResponse,

    /// Credential store failure
    #[error("Credential store error: {0}")]
    Store(#[from] StoreError),

    /// Response body did not match the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ClientError {
    /// HTTP status associated with the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Unauthorized { .. } => Some(401),
            ClientError::Api { status, .. } => Some(*status),
            ClientError::RefreshFailed(RefreshError::Rejected { status, .. }) => Some(*status),
            _ => None,
        }
    }

    /// True when the session is gone and the login redirect already fired.
    /// Callers use this to skip their own logout handling.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, ClientError::RefreshFailed(_))
    }
}

/// Transport-level failure: no HTTP response was received
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),
}

impl TransportError {
    /// Short label used in structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            TransportError::Timeout(_) => "timeout",
            TransportError::Connect(_) => "connection_failed",
            TransportError::Request(_) => "request_error",
        }
    }
}

/// Why a token refresh failed.
///
/// Cloneable because a single refresh result is shared by every request
/// waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    #[error("no refresh token stored")]
    MissingRefreshToken,

    #[error("refresh rejected: {status} - {message}")]
    Rejected { status: u16, message: String },

    #[error("refresh request failed: {0}")]
    Network(String),

    #[error("invalid refresh response: {0}")]
    InvalidResponse(String),

    /// The refresh task panicked or was cancelled by runtime shutdown
    #[error("refresh aborted: {0}")]
    Aborted(String),
}

/// Credential store backend failure
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("credential store lock poisoned")]
    Poisoned,
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
