//! Business logic services

pub mod company_resolver;
pub mod contact_resolver;
pub mod import_history;
pub mod import_processor;
pub mod property_reconciler;
pub mod property_status;
pub mod row_extractor;
pub mod sheet_reader;
