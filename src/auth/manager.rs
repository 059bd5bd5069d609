use std::sync::Arc;

use super::redirect::LoginRedirect;
use super::store::{clear_tokens, read_token, write_tokens, CredentialStore};
use super::types::{CredentialKeys, LoginRequest, LoginResponse, TokenPair, LOGIN_ENDPOINT};
use crate::error::{ClientError, Result};
use crate::http_client::ApiRequest;
use crate::pipeline::Pipeline;

/// Session lifecycle: login, logout and status.
///
/// Login goes through a pipeline without the refresh stage, so bad
/// credentials come back as a plain `Unauthorized` instead of triggering a
/// refresh and a redirect.
pub struct SessionManager {
    /// Pipeline without auth attachment or refresh
    public: Pipeline,

    /// Credential store shared with the authenticated pipeline
    store: Arc<dyn CredentialStore>,

    redirect: Arc<dyn LoginRedirect>,

    keys: CredentialKeys,

    /// Login page the redirect points to
    login_path: String,
}

impl SessionManager {
    pub fn new(
        public: Pipeline,
        store: Arc<dyn CredentialStore>,
        redirect: Arc<dyn LoginRedirect>,
        keys: CredentialKeys,
        login_path: impl Into<String>,
    ) -> Self {
        Self {
            public,
            store,
            redirect,
            keys,
            login_path: login_path.into(),
        }
    }

    /// Exchange email/password for a token pair and store it
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair> {
        tracing::info!(email = email, "Logging in...");

        let request = ApiRequest::post(LOGIN_ENDPOINT).with_json(&LoginRequest { email, password })?;
        let response = self.public.dispatch(request).await.into_result()?;

        if !response.is_success() {
            return Err(ClientError::Api {
                status: response.status().as_u16(),
                message: response.error_message(),
            });
        }

        let data: LoginResponse = response.json()?;
        let tokens = match (data.access_token, data.refresh_token) {
            (Some(access), Some(refresh)) if !access.is_empty() && !refresh.is_empty() => {
                TokenPair {
                    access_token: access,
                    refresh_token: Some(refresh),
                }
            }
            _ => {
                tracing::error!("Login response is missing tokens");
                return Err(ClientError::InvalidLoginResponse);
            }
        };

        if let Some(ref user) = data.user {
            tracing::debug!(user = %user, "Login response carried user profile");
        }

        write_tokens(self.store.as_ref(), self.keys, &tokens)?;
        tracing::info!("✅ Login successful");

        Ok(tokens)
    }

    /// Remove both tokens and send the user to the login page
    pub fn logout(&self) -> Result<()> {
        let cleared = clear_tokens(self.store.as_ref(), self.keys);
        self.redirect.redirect_to_login(&self.login_path);
        tracing::info!("Logged out");
        cleared.map_err(ClientError::from)
    }

    /// Both tokens present and non-empty
    pub fn is_authenticated(&self) -> bool {
        self.tokens().is_some_and(|t| t.refresh_token.is_some())
    }

    /// Currently stored tokens, if an access token exists
    pub fn tokens(&self) -> Option<TokenPair> {
        let access_token = read_token(self.store.as_ref(), self.keys.access_token)?;
        Some(TokenPair {
            access_token,
            refresh_token: read_token(self.store.as_ref(), self.keys.refresh_token),
        })
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }
}
