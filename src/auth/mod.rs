// Authentication module
// Credential storage, token refresh and session lifecycle

mod manager;
mod redirect;
mod refresh;
pub(crate) mod store;
mod types;

pub use manager::SessionManager;
pub use redirect::{LogRedirect, LoginRedirect};
pub use refresh::{request_new_tokens, RefreshCoordinator};
pub use store::{CredentialStore, MemoryCredentialStore, SqliteCredentialStore};
pub use types::{
    CredentialKeys, RefreshStyle, TokenPair, DEFAULT_LOGIN_PATH, LOGIN_ENDPOINT, REFRESH_ENDPOINT,
};
