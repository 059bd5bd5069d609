use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::auth::{CredentialKeys, RefreshStyle, DEFAULT_LOGIN_PATH};

/// Studio admin API client
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// API origin
    #[arg(short = 'u', long, env = "STUDIO_API_URL", default_value = "http://localhost:8000")]
    pub api_url: String,

    /// Path to the SQLite credential store
    #[arg(short = 'd', long, env = "CREDENTIALS_DB")]
    pub credentials_db: Option<String>,

    /// Login page the user is sent to when the session expires
    #[arg(long, env = "LOGIN_PATH", default_value = DEFAULT_LOGIN_PATH)]
    pub login_path: String,

    /// Credential key naming (camel, snake)
    #[arg(long, env = "TOKEN_KEY_STYLE", default_value = "camel")]
    pub token_key_style: String,

    /// How the refresh token is sent (bearer, body)
    #[arg(long, env = "REFRESH_STYLE", default_value = "bearer")]
    pub refresh_style: String,

    /// HTTP connect timeout in seconds
    #[arg(long, env = "HTTP_CONNECT_TIMEOUT", default_value = "10")]
    pub http_connect_timeout: u64,

    /// HTTP request timeout in seconds
    #[arg(long, env = "HTTP_REQUEST_TIMEOUT", default_value = "30")]
    pub http_timeout: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Body logging (off, errors, all)
    #[arg(long, env = "DEBUG_MODE", default_value = "off")]
    pub debug_mode: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Sign in and store the token pair
    Login {
        #[arg(short, long)]
        email: String,

        /// Prompted for when omitted
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Remove stored tokens
    Logout,

    /// Show whether a session is stored
    Status,

    /// List portfolios
    Portfolios {
        #[arg(long, default_value = "1")]
        page: u32,
        #[arg(long, default_value = "12")]
        per_page: u32,
    },

    /// List columns
    Columns {
        #[arg(long, default_value = "1")]
        page: u32,
        #[arg(long, default_value = "12")]
        per_page: u32,
        /// DRAFT, PUBLISHED or ARCHIVED
        #[arg(long)]
        status: Option<String>,
    },

    /// List reviews
    Reviews {
        #[arg(long, default_value = "1")]
        page: u32,
        #[arg(long, default_value = "12")]
        per_page: u32,
    },

    /// Review statistics
    ReviewStats,

    /// Authenticated GET of an arbitrary API path
    Get { path: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    // API
    pub api_url: String,
    pub login_path: String,

    // Credentials
    pub credentials_db: PathBuf,
    pub credential_keys: CredentialKeys,
    pub refresh_style: RefreshStyle,

    // HTTP client
    pub http_connect_timeout: u64,
    pub http_request_timeout: u64,

    // Debug
    pub log_level: String,
    pub debug_mode: DebugMode,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DebugMode {
    Off,
    Errors,
    All,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".to_string(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            credentials_db: default_credentials_db(),
            credential_keys: CredentialKeys::camel_case(),
            refresh_style: RefreshStyle::BearerHeader,
            http_connect_timeout: 10,
            http_request_timeout: 30,
            log_level: "info".to_string(),
            debug_mode: DebugMode::Off,
        }
    }
}

impl Config {
    /// Load configuration with priority: CLI > ENV (.env included) > defaults
    pub fn load() -> Result<(Self, Command)> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let args = CliArgs::parse();
        let config = Self::from_args(&args)?;
        config.validate()?;

        Ok((config, args.command))
    }

    /// Build configuration from parsed arguments
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        let credentials_db = match args.credentials_db {
            Some(ref path) => expand_tilde(path),
            None => default_credentials_db(),
        };

        Ok(Config {
            api_url: args.api_url.trim_end_matches('/').to_string(),
            login_path: args.login_path.clone(),
            credentials_db,
            credential_keys: parse_token_key_style(&args.token_key_style),
            refresh_style: parse_refresh_style(&args.refresh_style),
            http_connect_timeout: args.http_connect_timeout,
            http_request_timeout: args.http_timeout,
            log_level: args.log_level.clone(),
            debug_mode: parse_debug_mode(&args.debug_mode),
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            anyhow::bail!(
                "STUDIO_API_URL must start with http:// or https://: {}",
                self.api_url
            );
        }

        if !self.login_path.starts_with('/') {
            anyhow::bail!("LOGIN_PATH must be an absolute path: {}", self.login_path);
        }

        if self.http_request_timeout == 0 {
            anyhow::bail!("HTTP_REQUEST_TIMEOUT must be greater than zero");
        }

        Ok(())
    }
}

/// Default location of the credential database
fn default_credentials_db() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("studio-client").join("credentials.sqlite3"))
        .unwrap_or_else(|| PathBuf::from("credentials.sqlite3"))
}

/// Expand tilde (~) in file paths to user's home directory
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Parse debug mode from string
fn parse_debug_mode(s: &str) -> DebugMode {
    match s.to_lowercase().as_str() {
        "errors" => DebugMode::Errors,
        "all" => DebugMode::All,
        _ => DebugMode::Off,
    }
}

/// Parse credential key naming from string
fn parse_token_key_style(s: &str) -> CredentialKeys {
    match s.to_lowercase().as_str() {
        "snake" | "snake_case" => CredentialKeys::snake_case(),
        _ => CredentialKeys::camel_case(), // default
    }
}

/// Parse refresh token transport from string
fn parse_refresh_style(s: &str) -> RefreshStyle {
    match s.to_lowercase().as_str() {
        "body" | "json" => RefreshStyle::JsonBody,
        _ => RefreshStyle::BearerHeader, // default
    }
}
