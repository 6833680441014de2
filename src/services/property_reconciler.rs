//! Property reconciliation
//!
//! One extracted row becomes one property write. Resolves the row's company
//! and contacts, then either creates the property or diffs its relationships
//! against what is stored. Relationship changes are written to the property's
//! change log and cascade onto the contacts that lost their link.
//!
//! Writes are not transactional; a failure halfway leaves earlier writes of
//! the row in place.

use anyhow::Result;
use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use super::company_resolver::resolve_company;
use super::contact_resolver::{resolve_property_manager, resolve_regional_manager};
use super::row_extractor::LeadRow;
use crate::store::LeadStore;
use crate::types::{ChangeLogEntry, Note, Property};

/// What happened to the row's property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    Created,
    Updated,
}

/// Ids resolved for the row before the property is touched
#[derive(Debug, Clone, Copy, Default)]
struct Links {
    company: Option<Uuid>,
    regional_manager: Option<Uuid>,
    property_manager: Option<Uuid>,
}

/// Reconcile one row against the store
pub async fn reconcile_row(store: &dyn LeadStore, row: &LeadRow, caller: Uuid) -> Result<RowOutcome> {
    let company = resolve_company(store, row.company.as_ref(), caller).await?;
    let company_id = company.as_ref().map(|c| c.id);

    let regional_manager = resolve_regional_manager(store, row.supervisor.as_ref(), company_id, caller).await?;
    let property_manager = resolve_property_manager(store, row.manager_name.as_deref(), company_id, caller).await?;

    let links = Links {
        company: company_id,
        regional_manager: regional_manager.as_ref().map(|c| c.id),
        property_manager: property_manager.as_ref().map(|c| c.id),
    };

    let (property, outcome) = match store.find_property_by_external_id(&row.external_id).await? {
        None => {
            let mut property = Property::new(row.external_id.clone(), row.name.clone(), row.unit_count, caller);
            apply_row(&mut property, row, links);
            store.insert_property(&property).await?;
            info!("Created property {} '{}'", property.external_id, property.name);
            (property, RowOutcome::Created)
        }
        Some(mut property) => {
            let (changes, company_changed) = record_relationship_changes(store, &property, links, caller).await?;

            apply_row(&mut property, row, links);
            if company_changed {
                property.office_email = None;
            }
            if !changes.is_empty() {
                debug!("Property {} changes: {:?}", property.external_id, changes);
                property.change_log.push(ChangeLogEntry {
                    timestamp: Utc::now(),
                    changes,
                    uploaded_by: caller,
                });
            }

            store.save_property(&property).await?;
            debug!("Updated property {} '{}'", property.external_id, property.name);
            (property, RowOutcome::Updated)
        }
    };

    for contact_id in [links.regional_manager, links.property_manager].into_iter().flatten() {
        link_contact_to_property(store, contact_id, property.id).await?;
    }

    Ok(outcome)
}

/// Overwrite every mapped field; status and history are left alone
fn apply_row(property: &mut Property, row: &LeadRow, links: Links) {
    property.name = row.name.clone();
    property.unit_count = row.unit_count;
    property.phone = row.phone.clone();
    property.office_email = row.office_email.clone();
    property.street = row.street.clone();
    property.city = row.city.clone();
    property.state = row.state.clone();
    property.zip = row.zip.clone();
    property.county = row.county.clone();
    property.lat = row.location.map(|(lat, _)| lat);
    property.lng = row.location.map(|(_, lng)| lng);
    property.price_class = row.price_class.clone();
    property.property_type = row.property_type.clone();
    property.fee_managed = row.fee_managed.clone();
    property.owner_name = row.owner_name.clone();
    property.management_company_id = links.company;
    property.regional_manager_id = links.regional_manager;
    property.property_manager_id = links.property_manager;
}

/// Diff the stored relationships against the resolved ones and apply the
/// contact side effects. Returns the change strings and whether the
/// management company changed.
async fn record_relationship_changes(
    store: &dyn LeadStore,
    property: &Property,
    links: Links,
    caller: Uuid,
) -> Result<(Vec<String>, bool)> {
    let mut changes = Vec::new();
    let mut company_changed = false;

    if let Some(old_company) = property.management_company_id {
        if links.company != Some(old_company) {
            let old_name = company_label(store, Some(old_company)).await?;
            let new_name = company_label(store, links.company).await?;
            changes.push(format!("Management Company changed from {} to {}", old_name, new_name));
            company_changed = true;

            let detached = store.list_contacts_for_company_property(old_company, property.id).await?;
            for mut contact in detached {
                contact.property_id = None;
                contact.notes.push(Note::new(
                    format!(
                        "Removed from property {} ({}) due to management company change from {} to {}",
                        property.name, property.external_id, old_name, new_name
                    ),
                    caller,
                ));
                store.save_contact(&contact).await?;
                debug!("Detached contact {} from property {}", contact.id, property.external_id);
            }
        }
    }

    let roles = [
        ("Regional Manager", property.regional_manager_id, links.regional_manager),
        ("Property Manager", property.property_manager_id, links.property_manager),
    ];
    for (role, old_id, new_id) in roles {
        let Some(old_id) = old_id else {
            continue;
        };
        if new_id == Some(old_id) {
            continue;
        }

        let old_contact = store.get_contact(old_id).await?;
        let old_name = old_contact
            .as_ref()
            .map(|c| c.full_name())
            .unwrap_or_else(|| old_id.to_string());
        let new_name = contact_label(store, new_id).await?;
        changes.push(format!("{} changed from {} to {}", role, old_name, new_name));

        if let Some(mut contact) = old_contact {
            contact.notes.push(Note::new(
                format!(
                    "Removed as {} of property {} ({}) due to management change",
                    role, property.name, property.external_id
                ),
                caller,
            ));
            store.save_contact(&contact).await?;
        }
    }

    Ok((changes, company_changed))
}

async fn company_label(store: &dyn LeadStore, id: Option<Uuid>) -> Result<String> {
    let Some(id) = id else {
        return Ok("None".to_string());
    };
    Ok(store
        .get_company(id)
        .await?
        .map(|c| c.name)
        .unwrap_or_else(|| id.to_string()))
}

async fn contact_label(store: &dyn LeadStore, id: Option<Uuid>) -> Result<String> {
    let Some(id) = id else {
        return Ok("None".to_string());
    };
    Ok(store
        .get_contact(id)
        .await?
        .map(|c| c.full_name())
        .unwrap_or_else(|| id.to_string()))
}

/// Point a contact at the property; re-read first so earlier side effects
/// of this row are not overwritten
async fn link_contact_to_property(store: &dyn LeadStore, contact_id: Uuid, property_id: Uuid) -> Result<()> {
    if let Some(mut contact) = store.get_contact(contact_id).await? {
        if contact.property_id != Some(property_id) {
            contact.property_id = Some(property_id);
            store.save_contact(&contact).await?;
        }
    }
    Ok(())
}
