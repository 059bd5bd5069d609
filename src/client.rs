// Authenticated API client
// Every call runs through: refresh-on-401 -> bearer attachment -> request log -> transport

use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::api::{ColumnApi, PortfolioApi, ReviewApi};
use crate::auth::{
    CredentialKeys, CredentialStore, LogRedirect, LoginRedirect, MemoryCredentialStore,
    RefreshCoordinator, RefreshStyle, SessionManager, DEFAULT_LOGIN_PATH,
};
use crate::config::{Config, DebugMode};
use crate::error::{ClientError, Result};
use crate::http_client::{ApiRequest, ApiResponse, ReqwestTransport, Transport};
use crate::pipeline::{AttachBearer, Outcome, Pipeline, RefreshOnUnauthorized, RequestLog};
use crate::utils::{request_id, resolve_asset_url};

/// Client for the studio API.
///
/// Attaches the stored access token to every request. A 401 triggers one
/// token refresh and one replay; if the refresh fails the stored tokens are
/// removed and the user is sent to the login page.
#[derive(Clone)]
pub struct ApiClient {
    authenticated: Pipeline,
    session: Arc<SessionManager>,
    base_url: String,
}

impl ApiClient {
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Build a client with a reqwest transport from loaded configuration
    pub fn from_config(
        config: &Config,
        store: Arc<dyn CredentialStore>,
        redirect: Arc<dyn LoginRedirect>,
    ) -> Result<Self> {
        Self::builder()
            .base_url(&config.api_url)
            .store(store)
            .redirect(redirect)
            .credential_keys(config.credential_keys)
            .refresh_style(config.refresh_style)
            .login_path(&config.login_path)
            .debug_mode(config.debug_mode)
            .timeouts(config.http_connect_timeout, config.http_request_timeout)
            .build()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Login, logout and session status
    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn portfolios(&self) -> PortfolioApi<'_> {
        PortfolioApi::new(self)
    }

    pub fn columns(&self) -> ColumnApi<'_> {
        ColumnApi::new(self)
    }

    pub fn reviews(&self) -> ReviewApi<'_> {
        ReviewApi::new(self)
    }

    /// Full URL for an asset path returned by the API
    pub fn asset_url(&self, path: &str) -> String {
        resolve_asset_url(&self.base_url, path)
    }

    /// Run a request through the authenticated pipeline and return the raw
    /// pipeline outcome
    pub async fn dispatch(&self, request: ApiRequest) -> Outcome {
        self.authenticated.dispatch(request).await
    }

    /// Run a request and return the response, whatever its status (except
    /// the 401 the pipeline handles)
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
        let id = request_id();
        tracing::debug!(
            request_id = %id,
            method = %request.method(),
            path = request.path(),
            "Dispatching request"
        );

        let result = self.dispatch(request).await.into_result();
        if let Err(ref e) = result {
            tracing::debug!(request_id = %id, error = %e, "Request failed");
        }
        result
    }

    /// Run a request and require a 2xx status
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let response = self.execute(request).await?;
        ensure_success(response)
    }

    /// Run a request and decode a 2xx JSON body
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let response = self.send(request).await?;
        Ok(response.json()?)
    }

    /// Authenticated GET decoded as JSON
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send_json(ApiRequest::get(path)).await
    }
}

/// Turn a non-2xx response into `ClientError::Api`
fn ensure_success(response: ApiResponse) -> Result<ApiResponse> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(ClientError::Api {
            status: response.status().as_u16(),
            message: response.error_message(),
        })
    }
}

/// Builder for ApiClient
pub struct ApiClientBuilder {
    base_url: Option<String>,
    transport: Option<Arc<dyn Transport>>,
    store: Option<Arc<dyn CredentialStore>>,
    redirect: Option<Arc<dyn LoginRedirect>>,
    keys: CredentialKeys,
    refresh_style: RefreshStyle,
    login_path: String,
    debug_mode: DebugMode,
    connect_timeout: u64,
    request_timeout: u64,
}

impl Default for ApiClientBuilder {
    fn default() -> Self {
        Self {
            base_url: None,
            transport: None,
            store: None,
            redirect: None,
            keys: CredentialKeys::default(),
            refresh_style: RefreshStyle::default(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            debug_mode: DebugMode::Off,
            connect_timeout: 10,
            request_timeout: 30,
        }
    }
}

impl ApiClientBuilder {
    /// API origin (required unless a custom transport is supplied)
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Use a custom transport instead of reqwest
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn redirect(mut self, redirect: Arc<dyn LoginRedirect>) -> Self {
        self.redirect = Some(redirect);
        self
    }

    pub fn credential_keys(mut self, keys: CredentialKeys) -> Self {
        self.keys = keys;
        self
    }

    pub fn refresh_style(mut self, style: RefreshStyle) -> Self {
        self.refresh_style = style;
        self
    }

    pub fn login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    pub fn debug_mode(mut self, mode: DebugMode) -> Self {
        self.debug_mode = mode;
        self
    }

    /// Connect and request timeouts in seconds
    pub fn timeouts(mut self, connect: u64, request: u64) -> Self {
        self.connect_timeout = connect;
        self.request_timeout = request;
        self
    }

    pub fn build(self) -> Result<ApiClient> {
        let base_url = self
            .base_url
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_default();

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => {
                if base_url.is_empty() {
                    return Err(ClientError::Config("base_url is required".to_string()));
                }
                Arc::new(ReqwestTransport::new(
                    &base_url,
                    self.connect_timeout,
                    self.request_timeout,
                )?)
            }
        };

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryCredentialStore::new()));
        let redirect = self.redirect.unwrap_or_else(|| Arc::new(LogRedirect));

        let coordinator = Arc::new(RefreshCoordinator::new(
            transport.clone(),
            store.clone(),
            redirect.clone(),
            self.keys,
            self.refresh_style,
            self.login_path.clone(),
        ));

        let authenticated = Pipeline::new(transport.clone())
            .with_stage(RefreshOnUnauthorized::new(coordinator))
            .with_stage(AttachBearer::new(store.clone(), self.keys))
            .with_stage(RequestLog::new(self.debug_mode));

        let public = Pipeline::new(transport).with_stage(RequestLog::new(self.debug_mode));

        let session = SessionManager::new(public, store, redirect, self.keys, self.login_path);

        tracing::debug!(
            base_url = %base_url,
            refresh_style = ?self.refresh_style,
            "API client ready"
        );

        Ok(ApiClient {
            authenticated,
            session: Arc::new(session),
            base_url,
        })
    }
}
