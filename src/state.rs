//! Shared application state for the HTTP and NATS surfaces

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::{Config, StoreBackend};
use crate::db;
use crate::services::import_history::ImportHistory;
use crate::services::import_processor::ImportService;
use crate::store::{LeadStore, MemoryLeadStore, PgLeadStore};

const PG_MAX_CONNECTIONS: u32 = 10;

#[derive(Clone)]
pub struct AppState {
    pub import: Arc<ImportService>,
    pub jwt_secret: Arc<String>,
}

impl AppState {
    pub fn new(store: Arc<dyn LeadStore>, jwt_secret: String, max_upload_bytes: usize) -> Self {
        let history = Arc::new(ImportHistory::new());
        Self {
            import: Arc::new(ImportService::new(store, history, max_upload_bytes)),
            jwt_secret: Arc::new(jwt_secret),
        }
    }

    pub fn store(&self) -> &dyn LeadStore {
        self.import.store()
    }
}

/// Build the configured store; postgres connects and migrates first
pub async fn create_store(config: &Config) -> Result<Arc<dyn LeadStore>> {
    let store: Arc<dyn LeadStore> = match config.store_backend {
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set when STORE_BACKEND is postgres")?;
            let pool = db::create_pool(url, PG_MAX_CONNECTIONS).await?;
            info!("Connected to PostgreSQL");
            db::run_migrations(&pool).await?;
            Arc::new(PgLeadStore::new(pool))
        }
        StoreBackend::Memory => Arc::new(MemoryLeadStore::new()),
    };
    info!("Lead store initialized: {}", store.name());
    Ok(store)
}
