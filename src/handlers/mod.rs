//! NATS message handlers

pub mod import;
pub mod ping;
pub mod property;

use anyhow::Result;
use async_nats::Client;
use tokio::select;
use tracing::{error, info};

use crate::state::AppState;

/// Start all message handlers
pub async fn start_handlers(client: Client, state: AppState) -> Result<()> {
    info!("Starting message handlers...");

    // Subscribe to all subjects
    let ping_sub = client.subscribe("leadbook.ping").await?;
    let import_sub = client.subscribe("leadbook.property.import").await?;
    let history_sub = client.subscribe("leadbook.import.history").await?;
    let property_get_sub = client.subscribe("leadbook.property.get").await?;
    let status_update_sub = client.subscribe("leadbook.property.status.update").await?;

    info!("Subscribed to NATS subjects");

    // Clone client and state for each handler
    let client_ping = client.clone();
    let client_import = client.clone();
    let client_history = client.clone();
    let client_property_get = client.clone();
    let client_status_update = client.clone();

    let state_import = state.clone();
    let state_history = state.clone();
    let state_property_get = state.clone();
    let state_status_update = state.clone();
    let store_name = state.store().name();

    // Spawn handlers
    let ping_handle = tokio::spawn(async move {
        ping::handle_ping(client_ping, ping_sub, store_name).await
    });

    let import_handle = tokio::spawn(async move {
        import::handle_import(client_import, import_sub, state_import).await
    });

    let history_handle = tokio::spawn(async move {
        import::handle_history(client_history, history_sub, state_history).await
    });

    let property_get_handle = tokio::spawn(async move {
        property::handle_get(client_property_get, property_get_sub, state_property_get).await
    });

    let status_update_handle = tokio::spawn(async move {
        property::handle_update_status(client_status_update, status_update_sub, state_status_update).await
    });

    info!("All handlers started, waiting for messages...");

    // Wait for any handler to finish (which would indicate an error)
    select! {
        result = ping_handle => {
            error!("Ping handler finished: {:?}", result);
        }
        result = import_handle => {
            error!("Import handler finished: {:?}", result);
        }
        result = history_handle => {
            error!("Import history handler finished: {:?}", result);
        }
        result = property_get_handle => {
            error!("Property get handler finished: {:?}", result);
        }
        result = status_update_handle => {
            error!("Property status update handler finished: {:?}", result);
        }
    }

    Ok(())
}
