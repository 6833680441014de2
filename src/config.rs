//! Configuration management

use std::net::SocketAddr;
use std::str::FromStr;

use anyhow::{self, Context, Result};

const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Which [`crate::store::LeadStore`] implementation backs the worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(StoreBackend::Postgres),
            "memory" | "mem" => Ok(StoreBackend::Memory),
            other => anyhow::bail!("Unknown STORE_BACKEND '{}', expected postgres or memory", other),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// NATS server URL
    pub nats_url: String,

    /// Optional NATS credentials
    pub nats_user: Option<String>,
    pub nats_password: Option<String>,

    /// PostgreSQL connection string (postgres backend only)
    pub database_url: Option<String>,

    pub store_backend: StoreBackend,

    /// Listen address of the HTTP upload endpoint
    pub http_addr: SocketAddr,

    /// JWT secret key for token validation
    pub jwt_secret: String,

    /// Largest accepted spreadsheet upload
    pub max_upload_bytes: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let nats_url = std::env::var("NATS_URL")
            .unwrap_or_else(|_| "nats://localhost:4222".to_string());

        let nats_user = std::env::var("NATS_USER").ok().filter(|u| !u.is_empty());
        let nats_password = std::env::var("NATS_PASSWORD").ok();

        let store_backend = match std::env::var("STORE_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => StoreBackend::Postgres,
        };

        let database_url = std::env::var("DATABASE_URL").ok();
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL must be set when STORE_BACKEND is postgres");
        }

        let http_addr = std::env::var("HTTP_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .context("HTTP_ADDR must be a socket address, e.g. 0.0.0.0:8080")?;

        let jwt_secret = std::env::var("JWT_SECRET")
            .context("JWT_SECRET must be set, generate one with: openssl rand -base64 48")?;
        validate_jwt_secret(&jwt_secret)?;

        let max_upload_bytes = match std::env::var("MAX_UPLOAD_BYTES") {
            Ok(value) => value
                .parse()
                .context("MAX_UPLOAD_BYTES must be a positive integer")?,
            Err(_) => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Self {
            nats_url,
            nats_user,
            nats_password,
            database_url,
            store_backend,
            http_addr,
            jwt_secret,
            max_upload_bytes,
        })
    }
}

fn validate_jwt_secret(jwt_secret: &str) -> Result<()> {
    if jwt_secret.len() < 32 {
        anyhow::bail!(
            "JWT_SECRET must be at least 32 bytes (current: {} bytes). Generate one with: openssl rand -base64 48",
            jwt_secret.len()
        );
    }

    const KNOWN_DEV_SECRETS: &[&str] = &[
        "dev-secret-change-in-production-min-32-bytes!!",
    ];
    if KNOWN_DEV_SECRETS.contains(&jwt_secret) {
        tracing::warn!("JWT_SECRET matches a known default, change it for production!");
    }
    Ok(())
}
