//! PostgreSQL-backed store

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{CompanyScope, LeadStore};
use crate::db::queries;
use crate::types::{Company, Contact, Property};

/// Production store delegating to the sqlx queries in `db::queries`
#[derive(Clone)]
pub struct PgLeadStore {
    pool: PgPool,
}

impl PgLeadStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeadStore for PgLeadStore {
    async fn find_company_by_name(&self, name: &str) -> Result<Option<Company>> {
        queries::company::find_company_by_name(&self.pool, name).await
    }

    async fn get_company(&self, id: Uuid) -> Result<Option<Company>> {
        queries::company::get_company(&self.pool, id).await
    }

    async fn insert_company(&self, company: &Company) -> Result<()> {
        queries::company::insert_company(&self.pool, company).await
    }

    async fn save_company(&self, company: &Company) -> Result<()> {
        queries::company::save_company(&self.pool, company).await
    }

    async fn find_contact_by_email(&self, email: &str) -> Result<Option<Contact>> {
        queries::contact::find_contact_by_email(&self.pool, email).await
    }

    async fn find_contact_by_name(
        &self,
        first_name: &str,
        last_name: &str,
        scope: CompanyScope,
    ) -> Result<Option<Contact>> {
        let company_id = match scope {
            CompanyScope::Company(id) => Some(id),
            CompanyScope::Any => None,
        };
        queries::contact::find_contact_by_name(&self.pool, first_name, last_name, company_id).await
    }

    async fn get_contact(&self, id: Uuid) -> Result<Option<Contact>> {
        queries::contact::get_contact(&self.pool, id).await
    }

    async fn insert_contact(&self, contact: &Contact) -> Result<()> {
        queries::contact::insert_contact(&self.pool, contact).await
    }

    async fn save_contact(&self, contact: &Contact) -> Result<()> {
        queries::contact::save_contact(&self.pool, contact).await
    }

    async fn list_contacts_for_company_property(
        &self,
        company_id: Uuid,
        property_id: Uuid,
    ) -> Result<Vec<Contact>> {
        queries::contact::list_contacts_for_company_property(&self.pool, company_id, property_id).await
    }

    async fn find_property_by_external_id(&self, external_id: &str) -> Result<Option<Property>> {
        queries::property::find_property_by_external_id(&self.pool, external_id).await
    }

    async fn insert_property(&self, property: &Property) -> Result<()> {
        queries::property::insert_property(&self.pool, property).await
    }

    async fn save_property(&self, property: &Property) -> Result<()> {
        queries::property::save_property(&self.pool, property).await
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}
