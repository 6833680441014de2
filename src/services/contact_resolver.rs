//! Contact find-or-create for area supervisors and property managers
//!
//! Contacts have no natural key. Supervisors are matched by email first and
//! then by name within their company; managers by name within their company
//! and then by name anywhere, to follow a manager who moved companies.
//! An existing title is never replaced.

use anyhow::Result;
use tracing::debug;
use uuid::Uuid;

use super::row_extractor::{split_name, SupervisorFields};
use crate::store::{CompanyScope, LeadStore};
use crate::types::{Contact, TITLE_AREA_SUPERVISOR, TITLE_PROPERTY_MANAGER};

/// Resolve the row's area supervisor (regional manager).
///
/// On a match, email and phone are refreshed from the row and the company is
/// moved to `company_id` when one was resolved.
pub async fn resolve_regional_manager(
    store: &dyn LeadStore,
    fields: Option<&SupervisorFields>,
    company_id: Option<Uuid>,
    caller: Uuid,
) -> Result<Option<Contact>> {
    let Some(fields) = fields else {
        return Ok(None);
    };
    let Some((first_name, last_name)) = split_name(&fields.name) else {
        return Ok(None);
    };

    let existing = match store.find_contact_by_email(&fields.email).await? {
        Some(contact) => Some(contact),
        None => {
            store
                .find_contact_by_name(&first_name, &last_name, CompanyScope::from_company(company_id))
                .await?
        }
    };

    match existing {
        Some(mut contact) => {
            contact.email = Some(fields.email.clone());
            if let Some(phone) = fields.phone.as_ref().filter(|p| !p.is_empty()) {
                contact.phone = Some(phone.clone());
            }
            contact.fill_title(TITLE_AREA_SUPERVISOR);
            if company_id.is_some() {
                contact.company_id = company_id;
            }

            store.save_contact(&contact).await?;
            debug!("Matched regional manager {} ({})", contact.full_name(), contact.id);
            Ok(Some(contact))
        }
        None => {
            let mut contact = Contact::new(first_name, last_name, caller);
            contact.email = Some(fields.email.clone());
            contact.phone = fields.phone.clone();
            contact.title = Some(TITLE_AREA_SUPERVISOR.to_string());
            contact.company_id = company_id;

            store.insert_contact(&contact).await?;
            debug!("Created regional manager {} ({})", contact.full_name(), contact.id);
            Ok(Some(contact))
        }
    }
}

/// Resolve the row's property manager by name.
///
/// On a match the contact's company is always set to `company_id`, even
/// when that is `None`.
pub async fn resolve_property_manager(
    store: &dyn LeadStore,
    name: Option<&str>,
    company_id: Option<Uuid>,
    caller: Uuid,
) -> Result<Option<Contact>> {
    let Some((first_name, last_name)) = name.and_then(split_name) else {
        return Ok(None);
    };

    let scoped = store
        .find_contact_by_name(&first_name, &last_name, CompanyScope::from_company(company_id))
        .await?;
    let existing = match scoped {
        Some(contact) => Some(contact),
        None => store.find_contact_by_name(&first_name, &last_name, CompanyScope::Any).await?,
    };

    match existing {
        Some(mut contact) => {
            let title_changed = contact.fill_title(TITLE_PROPERTY_MANAGER);
            if title_changed || contact.company_id != company_id {
                contact.company_id = company_id;
                store.save_contact(&contact).await?;
            }
            debug!("Matched property manager {} ({})", contact.full_name(), contact.id);
            Ok(Some(contact))
        }
        None => {
            let mut contact = Contact::new(first_name, last_name, caller);
            contact.title = Some(TITLE_PROPERTY_MANAGER.to_string());
            contact.company_id = company_id;

            store.insert_contact(&contact).await?;
            debug!("Created property manager {} ({})", contact.full_name(), contact.id);
            Ok(Some(contact))
        }
    }
}
