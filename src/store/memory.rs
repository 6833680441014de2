//! In-memory store (tests, local development)

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use super::{CompanyScope, LeadStore};
use crate::types::{Company, Contact, Property};

#[derive(Default)]
struct Collections {
    companies: Vec<Company>,
    contacts: Vec<Contact>,
    properties: Vec<Property>,
}

/// Deterministic store kept entirely in memory, in insertion order
#[derive(Default)]
pub struct MemoryLeadStore {
    data: RwLock<Collections>,
}

impl MemoryLeadStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn companies(&self) -> Vec<Company> {
        self.data.read().companies.clone()
    }

    pub fn contacts(&self) -> Vec<Contact> {
        self.data.read().contacts.clone()
    }

    pub fn properties(&self) -> Vec<Property> {
        self.data.read().properties.clone()
    }
}

fn replace<T>(items: &mut [T], id: Uuid, item: &T, id_of: impl Fn(&T) -> Uuid) -> Result<()>
where
    T: Clone,
{
    match items.iter_mut().find(|existing| id_of(existing) == id) {
        Some(slot) => {
            *slot = item.clone();
            Ok(())
        }
        None => bail!("Record {} not found", id),
    }
}

#[async_trait]
impl LeadStore for MemoryLeadStore {
    async fn find_company_by_name(&self, name: &str) -> Result<Option<Company>> {
        let data = self.data.read();
        Ok(data.companies.iter().find(|c| c.name == name).cloned())
    }

    async fn get_company(&self, id: Uuid) -> Result<Option<Company>> {
        let data = self.data.read();
        Ok(data.companies.iter().find(|c| c.id == id).cloned())
    }

    async fn insert_company(&self, company: &Company) -> Result<()> {
        self.data.write().companies.push(company.clone());
        Ok(())
    }

    async fn save_company(&self, company: &Company) -> Result<()> {
        let mut company = company.clone();
        company.updated_at = Utc::now();
        let mut data = self.data.write();
        replace(&mut data.companies, company.id, &company, |c| c.id)
    }

    async fn find_contact_by_email(&self, email: &str) -> Result<Option<Contact>> {
        let data = self.data.read();
        Ok(data
            .contacts
            .iter()
            .find(|c| c.email.as_deref() == Some(email))
            .cloned())
    }

    async fn find_contact_by_name(
        &self,
        first_name: &str,
        last_name: &str,
        scope: CompanyScope,
    ) -> Result<Option<Contact>> {
        let first = first_name.to_lowercase();
        let last = last_name.to_lowercase();
        let data = self.data.read();
        Ok(data
            .contacts
            .iter()
            .find(|c| {
                c.first_name.to_lowercase() == first
                    && c.last_name.to_lowercase() == last
                    && scope.admits(c.company_id)
            })
            .cloned())
    }

    async fn get_contact(&self, id: Uuid) -> Result<Option<Contact>> {
        let data = self.data.read();
        Ok(data.contacts.iter().find(|c| c.id == id).cloned())
    }

    async fn insert_contact(&self, contact: &Contact) -> Result<()> {
        self.data.write().contacts.push(contact.clone());
        Ok(())
    }

    async fn save_contact(&self, contact: &Contact) -> Result<()> {
        let mut contact = contact.clone();
        contact.updated_at = Utc::now();
        let mut data = self.data.write();
        replace(&mut data.contacts, contact.id, &contact, |c| c.id)
    }

    async fn list_contacts_for_company_property(
        &self,
        company_id: Uuid,
        property_id: Uuid,
    ) -> Result<Vec<Contact>> {
        let data = self.data.read();
        Ok(data
            .contacts
            .iter()
            .filter(|c| c.company_id == Some(company_id) && c.property_id == Some(property_id))
            .cloned()
            .collect())
    }

    async fn find_property_by_external_id(&self, external_id: &str) -> Result<Option<Property>> {
        let data = self.data.read();
        Ok(data
            .properties
            .iter()
            .find(|p| p.external_id == external_id)
            .cloned())
    }

    async fn insert_property(&self, property: &Property) -> Result<()> {
        let mut data = self.data.write();
        if data.properties.iter().any(|p| p.external_id == property.external_id) {
            bail!("Property with ALN Id {} already exists", property.external_id);
        }
        data.properties.push(property.clone());
        Ok(())
    }

    async fn save_property(&self, property: &Property) -> Result<()> {
        let mut property = property.clone();
        property.updated_at = Utc::now();
        let mut data = self.data.write();
        replace(&mut data.properties, property.id, &property, |p| p.id)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn company_lookup_is_case_sensitive() {
        let store = MemoryLeadStore::new();
        store.insert_company(&Company::new("Acme Mgmt", Uuid::nil())).await.unwrap();

        assert!(store.find_company_by_name("Acme Mgmt").await.unwrap().is_some());
        assert!(store.find_company_by_name("acme mgmt").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn contact_name_lookup_ignores_case_and_respects_scope() {
        let store = MemoryLeadStore::new();
        let company_id = Uuid::new_v4();
        let mut contact = Contact::new("Jane", "Doe", Uuid::nil());
        contact.company_id = Some(company_id);
        store.insert_contact(&contact).await.unwrap();

        let found = store
            .find_contact_by_name("JANE", "doe", CompanyScope::Company(company_id))
            .await
            .unwrap();
        assert_eq!(found.map(|c| c.id), Some(contact.id));

        let other_company = store
            .find_contact_by_name("Jane", "Doe", CompanyScope::Company(Uuid::new_v4()))
            .await
            .unwrap();
        assert!(other_company.is_none());

        let unscoped = store.find_contact_by_name("jane", "DOE", CompanyScope::Any).await.unwrap();
        assert!(unscoped.is_some());
    }

    #[tokio::test]
    async fn duplicate_external_id_is_rejected() {
        let store = MemoryLeadStore::new();
        store.insert_property(&Property::new("X1", "Oak Apts", 50, Uuid::nil())).await.unwrap();

        let err = store
            .insert_property(&Property::new("X1", "Other", 10, Uuid::nil()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("X1"));
    }

    #[tokio::test]
    async fn save_of_unknown_record_fails() {
        let store = MemoryLeadStore::new();
        let result = store.save_contact(&Contact::new("Ghost", "Ghost", Uuid::nil())).await;
        assert!(result.is_err());
    }
}
