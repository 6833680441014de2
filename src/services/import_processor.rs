//! Lead spreadsheet import
//!
//! Runs every data row through extraction and reconciliation, strictly in
//! order, each row in its own failure boundary. Later rows may reuse
//! companies and contacts created by earlier ones.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::import_history::ImportHistory;
use super::property_reconciler::{reconcile_row, RowOutcome};
use super::row_extractor::extract_row;
use super::sheet_reader::{read_workbook, Sheet};
use crate::error::ImportError;
use crate::store::LeadStore;
use crate::types::ImportResult;

/// Import all data rows of a parsed sheet. Never fails as a whole.
pub async fn import_sheet(store: &dyn LeadStore, sheet: &Sheet, caller: Uuid) -> ImportResult {
    let mut result = ImportResult::new();

    for row in &sheet.rows {
        let lead = match extract_row(row, &sheet.columns) {
            Ok(lead) => lead,
            Err(e) => {
                warn!("Skipping row {}: {}", row.number, e);
                result.record_error(row.number, e);
                continue;
            }
        };

        match reconcile_row(store, &lead, caller).await {
            Ok(RowOutcome::Created) => result.record_created(),
            Ok(RowOutcome::Updated) => result.record_updated(),
            Err(e) => {
                warn!("Row {} ({}) failed: {:#}", row.number, lead.external_id, e);
                result.record_error(row.number, format!("{:#}", e));
            }
        }
    }

    result
}

/// Whole-file import entry point shared by the HTTP, NATS and CLI surfaces
pub struct ImportService {
    store: Arc<dyn LeadStore>,
    history: Arc<ImportHistory>,
    max_upload_bytes: usize,
}

impl ImportService {
    pub fn new(store: Arc<dyn LeadStore>, history: Arc<ImportHistory>, max_upload_bytes: usize) -> Self {
        Self {
            store,
            history,
            max_upload_bytes,
        }
    }

    pub fn store(&self) -> &dyn LeadStore {
        self.store.as_ref()
    }

    pub fn history(&self) -> &ImportHistory {
        &self.history
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// Validate, parse and import one uploaded workbook, recording the run
    pub async fn run(&self, caller: Uuid, filename: &str, bytes: &[u8]) -> Result<ImportResult, ImportError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(
            "Import {} started by {}: '{}' ({} bytes, store: {})",
            run_id,
            caller,
            filename,
            bytes.len(),
            self.store.name()
        );

        let sheet = match self.parse(bytes) {
            Ok(sheet) => sheet,
            Err(e) => {
                error!("Import {} rejected: {}", run_id, e);
                self.history
                    .record_failed(run_id, caller, filename, started_at, e.to_string());
                return Err(e);
            }
        };

        let result = import_sheet(self.store.as_ref(), &sheet, caller).await;
        self.history
            .record_completed(run_id, caller, filename, started_at, &result);
        info!(
            "Import {} finished: {} created, {} updated, {} errors",
            run_id,
            result.created,
            result.updated,
            result.errors.len()
        );

        Ok(result)
    }

    fn parse(&self, bytes: &[u8]) -> Result<Sheet, ImportError> {
        if bytes.is_empty() {
            return Err(ImportError::NoFile);
        }
        if bytes.len() > self.max_upload_bytes {
            return Err(ImportError::FileTooLarge {
                limit: self.max_upload_bytes,
            });
        }
        Ok(read_workbook(bytes)?)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use anyhow::{bail, Result};
    use async_trait::async_trait;
    use rust_xlsxwriter::Workbook;

    use crate::error::SheetError;
    use crate::store::{CompanyScope, MemoryLeadStore};
    use crate::types::{Company, Contact, Property, PropertyStatus};

    /// Cell content for test workbooks
    pub(crate) enum Value<'a> {
        Text(&'a str),
        Number(f64),
        Blank,
    }

    /// Build an xlsx file with `headers` on row 1 and one line per data row
    pub(crate) fn workbook(headers: &[&str], rows: &[Vec<Value<'_>>]) -> Vec<u8> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, header) in headers.iter().enumerate() {
            sheet.write_string(0, col as u16, *header).unwrap();
        }
        for (r, row) in rows.iter().enumerate() {
            for (col, value) in row.iter().enumerate() {
                let (r, col) = (r as u32 + 1, col as u16);
                match value {
                    Value::Text(s) => {
                        sheet.write_string(r, col, *s).unwrap();
                    }
                    Value::Number(n) => {
                        sheet.write_number(r, col, *n).unwrap();
                    }
                    Value::Blank => {}
                }
            }
        }
        workbook.save_to_buffer().unwrap()
    }

    const HEADERS: [&str; 4] = ["ALN Id", "Property Name", "# Units", "Management Company"];

    fn lead<'a>(id: &'a str, name: &'a str, units: f64, company: &'a str) -> Vec<Value<'a>> {
        vec![Value::Text(id), Value::Text(name), Value::Number(units), Value::Text(company)]
    }

    fn service(store: Arc<dyn LeadStore>) -> ImportService {
        ImportService::new(store, Arc::new(ImportHistory::new()), 1024 * 1024)
    }

    /// Memory store that refuses to insert properties with one external id
    struct FailingStore {
        inner: MemoryLeadStore,
        reject_external_id: &'static str,
    }

    #[async_trait]
    impl LeadStore for FailingStore {
        async fn find_company_by_name(&self, name: &str) -> Result<Option<Company>> {
            self.inner.find_company_by_name(name).await
        }
        async fn get_company(&self, id: Uuid) -> Result<Option<Company>> {
            self.inner.get_company(id).await
        }
        async fn insert_company(&self, company: &Company) -> Result<()> {
            self.inner.insert_company(company).await
        }
        async fn save_company(&self, company: &Company) -> Result<()> {
            self.inner.save_company(company).await
        }
        async fn find_contact_by_email(&self, email: &str) -> Result<Option<Contact>> {
            self.inner.find_contact_by_email(email).await
        }
        async fn find_contact_by_name(
            &self,
            first_name: &str,
            last_name: &str,
            scope: CompanyScope,
        ) -> Result<Option<Contact>> {
            self.inner.find_contact_by_name(first_name, last_name, scope).await
        }
        async fn get_contact(&self, id: Uuid) -> Result<Option<Contact>> {
            self.inner.get_contact(id).await
        }
        async fn insert_contact(&self, contact: &Contact) -> Result<()> {
            self.inner.insert_contact(contact).await
        }
        async fn save_contact(&self, contact: &Contact) -> Result<()> {
            self.inner.save_contact(contact).await
        }
        async fn list_contacts_for_company_property(
            &self,
            company_id: Uuid,
            property_id: Uuid,
        ) -> Result<Vec<Contact>> {
            self.inner.list_contacts_for_company_property(company_id, property_id).await
        }
        async fn find_property_by_external_id(&self, external_id: &str) -> Result<Option<Property>> {
            self.inner.find_property_by_external_id(external_id).await
        }
        async fn insert_property(&self, property: &Property) -> Result<()> {
            if property.external_id == self.reject_external_id {
                bail!("connection reset");
            }
            self.inner.insert_property(property).await
        }
        async fn save_property(&self, property: &Property) -> Result<()> {
            self.inner.save_property(property).await
        }
        fn name(&self) -> &'static str {
            "failing"
        }
    }

    #[tokio::test]
    async fn oak_apts_on_empty_store() {
        let store = Arc::new(MemoryLeadStore::new());
        let bytes = workbook(&HEADERS, &[lead("X1", "Oak Apts", 50.0, "Acme Mgmt")]);

        let result = service(store.clone()).run(Uuid::new_v4(), "leads.xlsx", &bytes).await.unwrap();

        assert_eq!(result, ImportResult { created: 1, updated: 0, errors: vec![] });
        let companies = store.companies();
        assert_eq!(companies.len(), 1);
        assert_eq!(companies[0].name, "Acme Mgmt");
        let property = &store.properties()[0];
        assert_eq!(property.name, "Oak Apts");
        assert_eq!(property.unit_count, 50);
        assert_eq!(property.status, PropertyStatus::Lead);
        assert!(property.change_log.is_empty());
        assert_eq!(property.management_company_id, Some(companies[0].id));
    }

    #[tokio::test]
    async fn reimport_is_idempotent() {
        let store = Arc::new(MemoryLeadStore::new());
        let service = service(store.clone());
        let bytes = workbook(&HEADERS, &[lead("X1", "Oak Apts", 50.0, "Acme Mgmt")]);

        let first = service.run(Uuid::nil(), "leads.xlsx", &bytes).await.unwrap();
        let second = service.run(Uuid::nil(), "leads.xlsx", &bytes).await.unwrap();

        assert_eq!((first.created, first.updated), (1, 0));
        assert_eq!((second.created, second.updated), (0, 1));
        assert_eq!(store.properties().len(), 1);
        assert_eq!(store.companies().len(), 1);
        assert!(store.properties()[0].change_log.is_empty());
    }

    #[tokio::test]
    async fn bad_row_does_not_stop_the_batch() {
        let store = Arc::new(MemoryLeadStore::new());
        let bytes = workbook(
            &HEADERS,
            &[
                lead("X1", "Oak Apts", 50.0, "Acme Mgmt"),
                lead("X2", "Elm Court", 12.0, "Acme Mgmt"),
                vec![Value::Blank, Value::Text("No Id Manor"), Value::Number(8.0)],
                lead("X4", "Pine Villas", 30.0, "Acme Mgmt"),
                lead("X5", "Birch Lofts", 44.0, "Acme Mgmt"),
            ],
        );

        let result = service(store.clone()).run(Uuid::nil(), "leads.xlsx", &bytes).await.unwrap();

        assert_eq!(result.created, 4);
        assert_eq!(result.errors, vec!["Row 4: Missing ALN Id".to_string()]);
        assert_eq!(store.properties().len(), 4);
        assert_eq!(store.companies().len(), 1);
    }

    #[tokio::test]
    async fn missing_required_fields_are_reported() {
        let store = Arc::new(MemoryLeadStore::new());
        let bytes = workbook(
            &HEADERS,
            &[vec![Value::Text("X1"), Value::Blank, Value::Text("many")]],
        );

        let result = service(store).run(Uuid::nil(), "leads.xlsx", &bytes).await.unwrap();

        assert_eq!(result.processed(), 1);
        assert!(result.errors[0].starts_with("Row 2: Missing required fields"));
        assert!(result.errors[0].contains("Property Name"));
        assert!(result.errors[0].contains("# Units"));
    }

    #[tokio::test]
    async fn store_failure_is_confined_to_its_row() {
        let store = Arc::new(FailingStore {
            inner: MemoryLeadStore::new(),
            reject_external_id: "X2",
        });
        let bytes = workbook(
            &HEADERS,
            &[
                lead("X1", "Oak Apts", 50.0, "Acme Mgmt"),
                lead("X2", "Elm Court", 12.0, "Acme Mgmt"),
                lead("X3", "Pine Villas", 30.0, "Acme Mgmt"),
            ],
        );

        let result = service(store.clone()).run(Uuid::nil(), "leads.xlsx", &bytes).await.unwrap();

        assert_eq!(result.created, 2);
        assert_eq!(result.errors, vec!["Row 3: connection reset".to_string()]);
        assert_eq!(store.inner.properties().len(), 2);
    }

    #[tokio::test]
    async fn later_rows_reuse_entities_from_earlier_rows() {
        let store = Arc::new(MemoryLeadStore::new());
        let headers = ["ALN Id", "Property Name", "# Units", "Management Company", "Manager"];
        let bytes = workbook(
            &headers,
            &[
                vec![
                    Value::Text("X1"),
                    Value::Text("Oak Apts"),
                    Value::Number(50.0),
                    Value::Text("Acme Mgmt"),
                    Value::Text("Pat Kim"),
                ],
                vec![
                    Value::Text("X2"),
                    Value::Text("Elm Court"),
                    Value::Number(12.0),
                    Value::Text("Acme Mgmt"),
                    Value::Text("Pat Kim"),
                ],
            ],
        );

        service(store.clone()).run(Uuid::nil(), "leads.xlsx", &bytes).await.unwrap();

        let contacts = store.contacts();
        assert_eq!(contacts.len(), 1);
        // a contact belongs to at most one property: the last one imported
        let elm = store
            .properties()
            .into_iter()
            .find(|p| p.external_id == "X2")
            .unwrap();
        assert_eq!(contacts[0].property_id, Some(elm.id));
    }

    #[tokio::test]
    async fn status_is_preserved_across_reimport() {
        let store = Arc::new(MemoryLeadStore::new());
        let service = service(store.clone());
        let bytes = workbook(&HEADERS, &[lead("X1", "Oak Apts", 50.0, "Acme Mgmt")]);
        service.run(Uuid::nil(), "leads.xlsx", &bytes).await.unwrap();

        let mut property = store.properties()[0].clone();
        property.status = PropertyStatus::CurrentClient;
        store.save_property(&property).await.unwrap();

        service.run(Uuid::nil(), "leads.xlsx", &bytes).await.unwrap();
        assert_eq!(store.properties()[0].status, PropertyStatus::CurrentClient);
    }

    #[tokio::test]
    async fn whole_file_failures_abort_before_rows() {
        let store = Arc::new(MemoryLeadStore::new());
        let service = ImportService::new(store.clone(), Arc::new(ImportHistory::new()), 64);

        let empty = service.run(Uuid::nil(), "empty.xlsx", &[]).await.unwrap_err();
        assert!(matches!(empty, ImportError::NoFile));

        let garbage = service.run(Uuid::nil(), "junk.xlsx", b"not a workbook").await.unwrap_err();
        assert!(matches!(garbage, ImportError::Sheet(SheetError::Unreadable(_))));

        let large = service.run(Uuid::nil(), "big.xlsx", &[0u8; 65]).await.unwrap_err();
        assert!(matches!(large, ImportError::FileTooLarge { limit: 64 }));

        assert!(store.properties().is_empty());
    }

    #[tokio::test]
    async fn runs_are_recorded_in_history() {
        let store = Arc::new(MemoryLeadStore::new());
        let service = service(store);
        let caller = Uuid::new_v4();
        let bytes = workbook(&HEADERS, &[lead("X1", "Oak Apts", 50.0, "Acme Mgmt")]);

        service.run(caller, "leads.xlsx", &bytes).await.unwrap();
        service.run(caller, "junk.xlsx", b"nope").await.unwrap_err();

        let history = service.history().recent_for_user(caller, 10);
        assert_eq!(history.total, 2);
        assert_eq!(history.runs[0].filename, "junk.xlsx");
        assert!(history.runs[0].error.is_some());
        assert_eq!(history.runs[1].created, 1);
    }
}
