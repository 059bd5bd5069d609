// Authentication types

use serde::{Deserialize, Serialize};

/// Login endpoint
pub const LOGIN_ENDPOINT: &str = "/api/v1/auth/login";

/// Token refresh endpoint
pub const REFRESH_ENDPOINT: &str = "/api/v1/auth/refresh";

/// Where the user is sent when the session cannot be recovered
pub const DEFAULT_LOGIN_PATH: &str = "/admin/login";

/// Credential store key names.
///
/// Deployments disagree on naming, so the pair is configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialKeys {
    pub access_token: &'static str,
    pub refresh_token: &'static str,
}

impl CredentialKeys {
    /// `accessToken` / `refreshToken` (admin console default)
    pub const fn camel_case() -> Self {
        Self {
            access_token: "accessToken",
            refresh_token: "refreshToken",
        }
    }

    /// `access_token` / `refresh_token`
    pub const fn snake_case() -> Self {
        Self {
            access_token: "access_token",
            refresh_token: "refresh_token",
        }
    }
}

impl Default for CredentialKeys {
    fn default() -> Self {
        Self::camel_case()
    }
}

/// How the refresh token travels to the refresh endpoint.
/// A client uses exactly one style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshStyle {
    /// `Authorization: Bearer <refresh_token>`, empty body
    #[default]
    BearerHeader,

    /// `{"refresh_token": "..."}` JSON body
    JsonBody,
}

/// Access/refresh token pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

/// Login request body
#[derive(Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Login response body
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub user: Option<serde_json::Value>,
}

/// Refresh request body (JSON body style only)
#[derive(Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

/// Refresh response body; the refresh token is only present when the
/// backend rotates it
#[derive(Debug, Deserialize)]
pub struct RefreshResponse {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}
