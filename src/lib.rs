// Studio Client - Library root

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http_client;
pub mod models;
pub mod pipeline;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use client::{ApiClient, ApiClientBuilder};
pub use error::{ClientError, RefreshError, Result, TransportError};
