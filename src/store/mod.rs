//! Record store abstraction used by the import engine
//!
//! The reconciler only needs a handful of find/insert/save primitives, so the
//! storage engine sits behind the [`LeadStore`] trait:
//! - [`PgLeadStore`] for production (PostgreSQL via sqlx)
//! - [`MemoryLeadStore`] for tests and local development
//!
//! Configuration via STORE_BACKEND env variable:
//! - "postgres" → PgLeadStore (default)
//! - "memory" → MemoryLeadStore

mod memory;
mod postgres;

pub use memory::MemoryLeadStore;
pub use postgres::PgLeadStore;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::types::{Company, Contact, Property};

/// Which contacts a name lookup may return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompanyScope {
    /// Only contacts linked to this company
    Company(Uuid),
    /// Any contact regardless of company
    Any,
}

impl CompanyScope {
    /// Scope to the company when one was resolved, otherwise search everything
    pub fn from_company(company_id: Option<Uuid>) -> Self {
        company_id.map(CompanyScope::Company).unwrap_or(CompanyScope::Any)
    }

    pub fn admits(&self, company_id: Option<Uuid>) -> bool {
        match self {
            CompanyScope::Company(id) => company_id == Some(*id),
            CompanyScope::Any => true,
        }
    }
}

/// Document store for properties, companies and contacts.
///
/// Each call is an independent read or write; nothing here spans a
/// transaction.
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Exact, case-sensitive name match
    async fn find_company_by_name(&self, name: &str) -> Result<Option<Company>>;
    async fn get_company(&self, id: Uuid) -> Result<Option<Company>>;
    async fn insert_company(&self, company: &Company) -> Result<()>;
    async fn save_company(&self, company: &Company) -> Result<()>;

    /// Exact email match
    async fn find_contact_by_email(&self, email: &str) -> Result<Option<Contact>>;
    /// Case-insensitive first + last name match within `scope`, oldest first
    async fn find_contact_by_name(
        &self,
        first_name: &str,
        last_name: &str,
        scope: CompanyScope,
    ) -> Result<Option<Contact>>;
    async fn get_contact(&self, id: Uuid) -> Result<Option<Contact>>;
    async fn insert_contact(&self, contact: &Contact) -> Result<()>;
    async fn save_contact(&self, contact: &Contact) -> Result<()>;
    /// Contacts linked to both the company and the property
    async fn list_contacts_for_company_property(
        &self,
        company_id: Uuid,
        property_id: Uuid,
    ) -> Result<Vec<Contact>>;

    async fn find_property_by_external_id(&self, external_id: &str) -> Result<Option<Property>>;
    async fn insert_property(&self, property: &Property) -> Result<()>;
    async fn save_property(&self, property: &Property) -> Result<()>;

    /// Get the name of this store implementation
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_from_missing_company_is_unscoped() {
        assert_eq!(CompanyScope::from_company(None), CompanyScope::Any);
    }

    #[test]
    fn company_scope_only_admits_matching_company() {
        let id = Uuid::new_v4();
        let scope = CompanyScope::from_company(Some(id));
        assert!(scope.admits(Some(id)));
        assert!(!scope.admits(Some(Uuid::new_v4())));
        assert!(!scope.admits(None));
        assert!(CompanyScope::Any.admits(None));
    }
}
