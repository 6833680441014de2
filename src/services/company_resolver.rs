//! Management company find-or-create

use anyhow::Result;
use tracing::debug;
use uuid::Uuid;

use super::row_extractor::CompanyFields;
use crate::store::LeadStore;
use crate::types::Company;

/// Write `incoming` into `slot` only when the slot is blank
fn backfill(slot: &mut Option<String>, incoming: Option<String>) -> bool {
    let blank = slot.as_deref().map_or(true, |value| value.trim().is_empty());
    match incoming {
        Some(value) if blank && !value.is_empty() => {
            *slot = Some(value);
            true
        }
        _ => false,
    }
}

/// Resolve the row's management company by exact name.
///
/// New companies are created with every supplied field. Existing companies
/// only get blank fields filled in; populated values are never replaced.
pub async fn resolve_company(
    store: &dyn LeadStore,
    fields: Option<&CompanyFields>,
    caller: Uuid,
) -> Result<Option<Company>> {
    let Some(fields) = fields else {
        return Ok(None);
    };

    match store.find_company_by_name(&fields.name).await? {
        None => {
            let mut company = Company::new(fields.name.clone(), caller);
            company.phone = fields.phone.clone();
            company.website = fields.website.clone();
            company.street = fields.street();
            company.city = fields.city.clone();
            company.state = fields.state.clone();
            company.zip = fields.zip.clone();

            store.insert_company(&company).await?;
            debug!("Created company '{}' ({})", company.name, company.id);
            Ok(Some(company))
        }
        Some(mut company) => {
            let mut changed = false;
            changed |= backfill(&mut company.website, fields.website.clone());
            changed |= backfill(&mut company.phone, fields.phone.clone());
            changed |= backfill(&mut company.street, fields.street());
            changed |= backfill(&mut company.city, fields.city.clone());
            changed |= backfill(&mut company.state, fields.state.clone());
            changed |= backfill(&mut company.zip, fields.zip.clone());

            if changed {
                store.save_company(&company).await?;
                debug!("Back-filled company '{}' ({})", company.name, company.id);
            }
            Ok(Some(company))
        }
    }
}
