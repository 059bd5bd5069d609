// Token refresh logic

use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::{Arc, Mutex, PoisonError};

use super::redirect::LoginRedirect;
use super::store::{clear_tokens, read_token, write_tokens, CredentialStore};
use super::types::{
    CredentialKeys, RefreshRequest, RefreshResponse, RefreshStyle, TokenPair, REFRESH_ENDPOINT,
};
use crate::error::RefreshError;
use crate::http_client::{ApiRequest, Transport};

/// Call the refresh endpoint directly on the transport.
///
/// Never goes through the request pipeline, so a 401 from the refresh
/// endpoint cannot trigger another refresh.
pub async fn request_new_tokens(
    transport: &dyn Transport,
    style: RefreshStyle,
    refresh_token: &str,
) -> Result<TokenPair, RefreshError> {
    tracing::info!("Refreshing access token...");

    let request = match style {
        RefreshStyle::BearerHeader => ApiRequest::post(REFRESH_ENDPOINT).with_bearer(refresh_token),
        RefreshStyle::JsonBody => ApiRequest::post(REFRESH_ENDPOINT)
            .with_json(&RefreshRequest { refresh_token })
            .map_err(|e| RefreshError::InvalidResponse(e.to_string()))?,
    };

    let response = transport
        .send(&request)
        .await
        .map_err(|e| RefreshError::Network(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let message = response.error_message();
        tracing::error!(
            status = status.as_u16(),
            message = %message,
            "Token refresh rejected"
        );
        return Err(RefreshError::Rejected {
            status: status.as_u16(),
            message,
        });
    }

    let data: RefreshResponse = response
        .json()
        .map_err(|e| RefreshError::InvalidResponse(e.to_string()))?;

    if data.access_token.is_empty() {
        return Err(RefreshError::InvalidResponse(
            "response does not contain access_token".to_string(),
        ));
    }

    tracing::info!(
        rotated = data.refresh_token.is_some(),
        "Access token refreshed"
    );

    Ok(TokenPair {
        access_token: data.access_token,
        refresh_token: data.refresh_token.filter(|t| !t.is_empty()),
    })
}

type SharedRefresh = Shared<BoxFuture<'static, Result<String, RefreshError>>>;

struct InFlight {
    generation: u64,
    refresh: SharedRefresh,
}

#[derive(Default)]
struct Slot {
    in_flight: Option<InFlight>,
    next_generation: u64,
}

/// Coalesces concurrent refreshes into one.
///
/// The first request that hits 401 starts the refresh; any request that hits
/// 401 while it is running awaits the same result. The refresh runs on its
/// own task: persisting new tokens, clearing them on failure, the login
/// redirect and releasing the in-flight slot all happen there, so they run
/// once per refresh even if every waiting request is dropped.
pub struct RefreshCoordinator {
    transport: Arc<dyn Transport>,
    store: Arc<dyn CredentialStore>,
    redirect: Arc<dyn LoginRedirect>,
    keys: CredentialKeys,
    style: RefreshStyle,
    login_path: String,
    slot: Arc<Mutex<Slot>>,
}

impl RefreshCoordinator {
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<dyn CredentialStore>,
        redirect: Arc<dyn LoginRedirect>,
        keys: CredentialKeys,
        style: RefreshStyle,
        login_path: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            store,
            redirect,
            keys,
            style,
            login_path: login_path.into(),
            slot: Arc::new(Mutex::new(Slot::default())),
        }
    }

    /// Produce a usable access token after a request carrying `rejected`
    /// came back 401.
    ///
    /// If the store already holds a different token (another request
    /// refreshed in the meantime) that token is returned without a new
    /// refresh call. Must be called from within a tokio runtime.
    pub async fn recover(&self, rejected: Option<&str>) -> Result<String, RefreshError> {
        let refresh = {
            let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);

            if let Some(ref in_flight) = slot.in_flight {
                tracing::debug!("Joining in-flight token refresh");
                in_flight.refresh.clone()
            } else {
                if let Some(current) = read_token(self.store.as_ref(), self.keys.access_token) {
                    if rejected != Some(current.as_str()) {
                        tracing::debug!("Access token already replaced, skipping refresh");
                        return Ok(current);
                    }
                }

                let generation = slot.next_generation;
                slot.next_generation += 1;

                let refresh = self.start_refresh(generation);
                slot.in_flight = Some(InFlight {
                    generation,
                    refresh: refresh.clone(),
                });
                refresh
            }
        };

        refresh.await
    }

    /// Spawn the refresh task for `generation` and return a shareable handle
    /// to its result
    fn start_refresh(&self, generation: u64) -> SharedRefresh {
        let transport = self.transport.clone();
        let store = self.store.clone();
        let redirect = self.redirect.clone();
        let slot = self.slot.clone();
        let aborted_slot = self.slot.clone();
        let keys = self.keys;
        let style = self.style;
        let login_path = self.login_path.clone();

        let task = tokio::spawn(async move {
            let result = match read_token(store.as_ref(), keys.refresh_token) {
                Some(refresh_token) => {
                    request_new_tokens(transport.as_ref(), style, &refresh_token).await
                }
                None => Err(RefreshError::MissingRefreshToken),
            };

            let result = match result {
                Ok(tokens) => {
                    if let Err(e) = write_tokens(store.as_ref(), keys, &tokens) {
                        tracing::error!(error = %e, "Failed to persist refreshed tokens");
                    }
                    Ok(tokens.access_token)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Token refresh failed, clearing credentials");
                    if let Err(store_err) = clear_tokens(store.as_ref(), keys) {
                        tracing::error!(error = %store_err, "Failed to clear credentials");
                    }
                    redirect.redirect_to_login(&login_path);
                    Err(e)
                }
            };

            // Store is settled; later 401s start from a clean slot
            release_slot(&slot, generation);
            result
        });

        task.map(move |joined| {
            joined.unwrap_or_else(|e| {
                tracing::error!(error = %e, "Token refresh task did not complete");
                release_slot(&aborted_slot, generation);
                Err(RefreshError::Aborted(e.to_string()))
            })
        })
        .boxed()
        .shared()
    }
}

fn release_slot(slot: &Mutex<Slot>, generation: u64) {
    let mut slot = slot.lock().unwrap_or_else(PoisonError::into_inner);
    if slot
        .in_flight
        .as_ref()
        .is_some_and(|f| f.generation == generation)
    {
        slot.in_flight = None;
    }
}
