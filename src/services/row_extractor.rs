//! Lead row extraction
//!
//! Maps one spreadsheet row onto typed property, company and contact fields.
//! Every column is looked up by its header first; legacy files without a
//! given header fall back to the column's fixed position.

use thiserror::Error;

use super::sheet_reader::{Cell, ColumnMap, SheetRow};

/// Known column: header text and its 1-based fallback position
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub header: &'static str,
    pub position: usize,
}

const fn column(header: &'static str, position: usize) -> Column {
    Column { header, position }
}

pub const ALN_ID: Column = column("ALN Id", 1);
pub const PROPERTY_NAME: Column = column("Property Name", 2);
pub const PHONE: Column = column("Phone #", 3);
pub const OFFICE_EMAIL: Column = column("Property eMail Address", 4);
pub const ADDRESS: Column = column("Address", 5);
pub const CITY: Column = column("City", 6);
pub const STATE: Column = column("State", 7);
pub const ZIP: Column = column("ZIP", 8);
pub const COUNTY: Column = column("County", 9);
pub const LATITUDE: Column = column("Latitude", 10);
pub const LONGITUDE: Column = column("Longitude", 11);
pub const PRICE_CLASS: Column = column("ALN Price Class", 12);
pub const PROPERTY_TYPE: Column = column("Prop Type", 13);
pub const FEE_MANAGED: Column = column("Fee Managed", 14);
pub const UNITS: Column = column("# Units", 15);
pub const COMPANY_NAME: Column = column("Management Company", 16);
pub const COMPANY_ADDRESS_1: Column = column("Mgmt Co Address 1", 17);
pub const COMPANY_ADDRESS_2: Column = column("Mgmt Co Address 2", 18);
pub const COMPANY_CITY: Column = column("Mgmt Co City", 19);
pub const COMPANY_STATE: Column = column("Mgmt Co State", 20);
pub const COMPANY_ZIP: Column = column("Mgmt Co ZIP", 21);
pub const COMPANY_PHONE: Column = column("Mgmt Co Phone #", 22);
pub const OWNER_NAME: Column = column("Owner Name", 23);
pub const SUPERVISOR_NAME: Column = column("Area Supervisor", 24);
pub const SUPERVISOR_EMAIL: Column = column("Area Supervisor Email", 25);
pub const SUPERVISOR_PHONE: Column = column("A/S Phone #", 26);
pub const MANAGER_NAME: Column = column("Manager", 27);
pub const COMPANY_WEBSITE: Column = column("URL", 28);

/// Why a row cannot be imported
#[derive(Debug, Error, PartialEq)]
pub enum RowError {
    #[error("Missing ALN Id")]
    MissingExternalId,
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingRequiredFields(Vec<&'static str>),
    #[error("Invalid # Units value: {0}")]
    InvalidUnitCount(f64),
}

/// Management company fields of a row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyFields {
    pub name: String,
    pub address_line_1: Option<String>,
    pub address_line_2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
}

impl CompanyFields {
    /// Address lines joined with ", ", skipping blank parts
    pub fn street(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.address_line_1, &self.address_line_2]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .filter(|part| !part.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

/// Area supervisor (regional manager) fields of a row
#[derive(Debug, Clone, PartialEq)]
pub struct SupervisorFields {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// Fully typed import row
#[derive(Debug, Clone, PartialEq)]
pub struct LeadRow {
    pub external_id: String,
    pub name: String,
    pub unit_count: i32,
    pub phone: Option<String>,
    pub office_email: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub county: Option<String>,
    pub location: Option<(f64, f64)>,
    pub price_class: Option<String>,
    pub property_type: Option<String>,
    pub fee_managed: Option<String>,
    pub owner_name: Option<String>,
    pub company: Option<CompanyFields>,
    /// Present only when both name and email are given
    pub supervisor: Option<SupervisorFields>,
    pub manager_name: Option<String>,
}

struct RowReader<'a> {
    row: &'a SheetRow,
    columns: &'a ColumnMap,
}

impl<'a> RowReader<'a> {
    fn cell(&self, column: Column) -> &'a Cell {
        match self.columns.get(column.header) {
            Some(idx) => self.row.cell(idx),
            None => self.row.cell(column.position - 1),
        }
    }

    fn text(&self, column: Column) -> Option<String> {
        self.cell(column).as_text()
    }

    fn number(&self, column: Column) -> Option<f64> {
        self.cell(column).as_number()
    }
}

/// Extract a typed lead row; required fields are ALN Id, Property Name and # Units
pub fn extract_row(row: &SheetRow, columns: &ColumnMap) -> Result<LeadRow, RowError> {
    let reader = RowReader { row, columns };

    let external_id = reader.text(ALN_ID).ok_or(RowError::MissingExternalId)?;

    let name = reader.text(PROPERTY_NAME);
    let units = reader.number(UNITS);
    let mut missing = Vec::new();
    if name.is_none() {
        missing.push(PROPERTY_NAME.header);
    }
    if units.is_none() {
        missing.push(UNITS.header);
    }
    let (Some(name), Some(units)) = (name, units) else {
        return Err(RowError::MissingRequiredFields(missing));
    };

    let unit_count = units.trunc();
    if unit_count < 1.0 || unit_count > i32::MAX as f64 {
        return Err(RowError::InvalidUnitCount(units));
    }

    let location = match (reader.number(LATITUDE), reader.number(LONGITUDE)) {
        (Some(lat), Some(lng)) => Some((lat, lng)),
        _ => None,
    };

    let company = reader.text(COMPANY_NAME).map(|name| CompanyFields {
        name,
        address_line_1: reader.text(COMPANY_ADDRESS_1),
        address_line_2: reader.text(COMPANY_ADDRESS_2),
        city: reader.text(COMPANY_CITY),
        state: reader.text(COMPANY_STATE),
        zip: reader.text(COMPANY_ZIP),
        phone: reader.text(COMPANY_PHONE),
        website: reader.text(COMPANY_WEBSITE),
    });

    let supervisor = match (reader.text(SUPERVISOR_NAME), reader.text(SUPERVISOR_EMAIL)) {
        (Some(name), Some(email)) => Some(SupervisorFields {
            name,
            email,
            phone: reader.text(SUPERVISOR_PHONE),
        }),
        _ => None,
    };

    Ok(LeadRow {
        external_id,
        name,
        unit_count: unit_count as i32,
        phone: reader.text(PHONE),
        office_email: reader.text(OFFICE_EMAIL),
        street: reader.text(ADDRESS),
        city: reader.text(CITY),
        state: reader.text(STATE),
        zip: reader.text(ZIP),
        county: reader.text(COUNTY),
        location,
        price_class: reader.text(PRICE_CLASS),
        property_type: reader.text(PROPERTY_TYPE),
        fee_managed: reader.text(FEE_MANAGED),
        owner_name: reader.text(OWNER_NAME),
        company,
        supervisor,
        manager_name: reader.text(MANAGER_NAME),
    })
}

/// Split "First Rest Of Name" into (first, last).
///
/// A single token is used as both first and last name.
pub fn split_name(full_name: &str) -> Option<(String, String)> {
    let mut tokens = full_name.split_whitespace();
    let first = tokens.next()?.to_string();
    let rest: Vec<&str> = tokens.collect();
    let last = if rest.is_empty() {
        first.clone()
    } else {
        rest.join(" ")
    };
    Some((first, last))
}
