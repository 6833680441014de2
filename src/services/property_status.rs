//! Property lookup and pipeline status changes

use anyhow::{anyhow, Result};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::store::LeadStore;
use crate::types::{Property, PropertyStatus, StatusChange};

pub async fn get_property(store: &dyn LeadStore, external_id: &str) -> Result<Option<Property>> {
    store.find_property_by_external_id(external_id.trim()).await
}

/// Move a property to `status`, appending to its status history.
///
/// Setting the current status again is a no-op and records nothing.
pub async fn set_property_status(
    store: &dyn LeadStore,
    external_id: &str,
    status: PropertyStatus,
    changed_by: Uuid,
) -> Result<Property> {
    let mut property = get_property(store, external_id)
        .await?
        .ok_or_else(|| anyhow!("Property {} not found", external_id))?;

    if property.status == status {
        return Ok(property);
    }

    property.status_history.push(StatusChange {
        status,
        previous_status: Some(property.status),
        timestamp: Utc::now(),
        changed_by,
    });
    info!(
        "Property {} status {} -> {} by {}",
        property.external_id, property.status, status, changed_by
    );
    property.status = status;

    store.save_property(&property).await?;
    Ok(property)
}
