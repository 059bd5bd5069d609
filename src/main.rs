use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;

use studio_client::auth::{LogRedirect, SqliteCredentialStore};
use studio_client::config::{Command, Config};
use studio_client::models::{ColumnStatus, ReviewQuery};
use studio_client::ApiClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (for log level)
    let (config, command) = Config::load()?;

    // Initialize logging with a configured level
    let log_level = config.log_level.to_lowercase();
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("API: {}", config.api_url);
    tracing::debug!("Credentials: {}", config.credentials_db.display());
    tracing::debug!("Debug mode: {:?}", config.debug_mode);

    let store = Arc::new(
        SqliteCredentialStore::open(&config.credentials_db).with_context(|| {
            format!(
                "Failed to open credential store at {}",
                config.credentials_db.display()
            )
        })?,
    );

    let client = ApiClient::from_config(&config, store, Arc::new(LogRedirect))
        .context("Failed to initialize API client")?;

    run(&client, command).await
}

async fn run(client: &ApiClient, command: Command) -> Result<()> {
    match command {
        Command::Login { email, password } => {
            let password = match password {
                Some(password) => password,
                None => dialoguer::Password::new()
                    .with_prompt("Password")
                    .interact()
                    .context("Failed to read password")?,
            };

            client.session().login(&email, &password).await?;
            println!("✅ Logged in as {}", email);
        }

        Command::Logout => {
            client.session().logout()?;
            println!("👋 Logged out");
        }

        Command::Status => {
            if client.session().is_authenticated() {
                println!("✅ Logged in ({})", client.base_url());
            } else {
                println!("❌ Not logged in (sign in at {})", client.session().login_path());
            }
        }

        Command::Portfolios { page, per_page } => {
            let portfolios = client.portfolios().list(page, per_page).await?;
            print_json(&portfolios)?;
        }

        Command::Columns {
            page,
            per_page,
            status,
        } => {
            let status = status
                .map(|s| s.parse::<ColumnStatus>())
                .transpose()
                .map_err(anyhow::Error::msg)?;
            let columns = client.columns().list(page, per_page, status).await?;
            print_json(&columns)?;
        }

        Command::Reviews { page, per_page } => {
            let query = ReviewQuery {
                page,
                per_page,
                ..Default::default()
            };
            let reviews = client.reviews().list(&query).await?;
            print_json(&reviews)?;
        }

        Command::ReviewStats => {
            let stats = client.reviews().stats().await?;
            print_json(&stats)?;
        }

        Command::Get { path } => {
            let path = if path.starts_with('/') || path.starts_with("http") {
                path
            } else {
                format!("/{}", path)
            };
            let body: serde_json::Value = client.get_json(&path).await?;
            print_json(&body)?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to format response")?;
    println!("{}", text);
    Ok(())
}
