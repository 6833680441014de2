//! Leadbook Worker - lead spreadsheet import for the property CRM
//!
//! Serves the upload endpoint over HTTP and the same import, plus property
//! lookups, over NATS request/reply.

mod auth;
mod cli;
mod config;
mod db;
mod error;
mod handlers;
mod http;
mod services;
mod state;
mod store;
mod types;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Command};
use crate::config::{Config, StoreBackend};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs directory - use LOGS_DIR env var or default to ../logs (relative to worker)
    let logs_dir = std::env::var("LOGS_DIR").unwrap_or_else(|_| "../logs".to_string());
    std::fs::create_dir_all(&logs_dir).ok();

    // File appender for persistent logs (daily rotation)
    let file_appender = RollingFileAppender::new(Rotation::DAILY, &logs_dir, "worker.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // Initialize logging - both stdout and file
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,leadbook_worker=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer()) // stdout
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false)) // file
        .init();

    let config = Config::from_env()?;
    info!("Configuration loaded");

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Migrate => migrate(&config).await,
        Command::Import { file, user } => import_file(&config, &file, user).await,
        Command::Token { user, email, hours } => {
            println!("{}", auth::generate_token(user, &email, hours, &config.jwt_secret)?);
            Ok(())
        }
    }
}

async fn serve(config: Config) -> Result<()> {
    info!("Starting Leadbook Worker...");

    let store = state::create_store(&config).await?;
    let state = AppState::new(store, config.jwt_secret.clone(), config.max_upload_bytes);

    // Connect to NATS (supports optional NATS_USER/NATS_PASSWORD auth).
    let nats_client = match (&config.nats_user, &config.nats_password) {
        (Some(user), Some(password)) => {
            async_nats::ConnectOptions::new()
                .user_and_password(user.clone(), password.clone())
                .connect(&config.nats_url)
                .await?
        }
        _ => async_nats::connect(&config.nats_url).await?,
    };
    info!("Connected to NATS at {}", config.nats_url);

    let http_state = state.clone();
    let http_addr = config.http_addr;
    let http_handle = tokio::spawn(async move { http::serve(http_addr, http_state).await });
    let nats_handle = tokio::spawn(async move { handlers::start_handlers(nats_client, state).await });

    tokio::select! {
        result = http_handle => {
            error!("HTTP server finished: {:?}", result);
        }
        result = nats_handle => {
            error!("NATS handlers finished: {:?}", result);
        }
    }

    Ok(())
}

async fn migrate(config: &Config) -> Result<()> {
    if config.store_backend != StoreBackend::Postgres {
        anyhow::bail!("migrate requires STORE_BACKEND=postgres");
    }
    // Creating the postgres store connects and applies pending migrations
    state::create_store(config).await?;
    info!("Database migrations complete");
    Ok(())
}

async fn import_file(config: &Config, file: &std::path::Path, user: uuid::Uuid) -> Result<()> {
    let bytes = std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let filename = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let store = state::create_store(config).await?;
    let state = AppState::new(store, config.jwt_secret.clone(), config.max_upload_bytes);

    let result = state.import.run(user, &filename, &bytes).await?;
    println!("{}", result.summary().trim_end());
    Ok(())
}
