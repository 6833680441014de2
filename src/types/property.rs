//! Property types

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

use super::Note;

/// Sales pipeline stage of a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "property_status")]
pub enum PropertyStatus {
    #[serde(rename = "Lead")]
    #[sqlx(rename = "Lead")]
    Lead,
    #[serde(rename = "Sales Working")]
    #[sqlx(rename = "Sales Working")]
    SalesWorking,
    #[serde(rename = "Proposal Sent")]
    #[sqlx(rename = "Proposal Sent")]
    ProposalSent,
    #[serde(rename = "Contract Signed")]
    #[sqlx(rename = "Contract Signed")]
    ContractSigned,
    #[serde(rename = "Onboarding")]
    #[sqlx(rename = "Onboarding")]
    Onboarding,
    #[serde(rename = "Current Client")]
    #[sqlx(rename = "Current Client")]
    CurrentClient,
    #[serde(rename = "Past Client")]
    #[sqlx(rename = "Past Client")]
    PastClient,
}

impl Default for PropertyStatus {
    fn default() -> Self {
        PropertyStatus::Lead
    }
}

impl PropertyStatus {
    pub const ALL: [PropertyStatus; 7] = [
        PropertyStatus::Lead,
        PropertyStatus::SalesWorking,
        PropertyStatus::ProposalSent,
        PropertyStatus::ContractSigned,
        PropertyStatus::Onboarding,
        PropertyStatus::CurrentClient,
        PropertyStatus::PastClient,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyStatus::Lead => "Lead",
            PropertyStatus::SalesWorking => "Sales Working",
            PropertyStatus::ProposalSent => "Proposal Sent",
            PropertyStatus::ContractSigned => "Contract Signed",
            PropertyStatus::Onboarding => "Onboarding",
            PropertyStatus::CurrentClient => "Current Client",
            PropertyStatus::PastClient => "Past Client",
        }
    }
}

impl fmt::Display for PropertyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropertyStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        PropertyStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| anyhow::anyhow!("Unknown property status: {}", s))
    }
}

/// One entry of a property's status history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub status: PropertyStatus,
    pub previous_status: Option<PropertyStatus>,
    pub timestamp: DateTime<Utc>,
    pub changed_by: Uuid,
}

/// One import pass worth of relationship changes on a property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeLogEntry {
    pub timestamp: DateTime<Utc>,
    pub changes: Vec<String>,
    pub uploaded_by: Uuid,
}

/// File attached to a property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub file_name: String,
    pub url: String,
    pub uploaded_at: DateTime<Utc>,
    pub uploaded_by: Option<Uuid>,
}

/// Property entity, keyed by its upstream ALN id
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: Uuid,
    pub external_id: String,
    pub name: String,
    pub phone: Option<String>,
    pub office_email: Option<String>,

    // Address
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub county: Option<String>,

    // Geolocation, both set or both empty
    pub lat: Option<f64>,
    pub lng: Option<f64>,

    pub price_class: Option<String>,
    pub property_type: Option<String>,
    pub fee_managed: Option<String>,
    pub unit_count: i32,
    pub owner_name: Option<String>,

    pub management_company_id: Option<Uuid>,
    pub regional_manager_id: Option<Uuid>,
    pub property_manager_id: Option<Uuid>,

    pub status: PropertyStatus,
    #[sqlx(json)]
    pub status_history: Vec<StatusChange>,
    #[sqlx(json)]
    pub change_log: Vec<ChangeLogEntry>,
    #[sqlx(json)]
    pub notes: Vec<Note>,
    #[sqlx(json)]
    pub attachments: Vec<Attachment>,

    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Property {
    /// A fresh lead with nothing but its identity filled in
    pub fn new(external_id: impl Into<String>, name: impl Into<String>, unit_count: i32, created_by: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            external_id: external_id.into(),
            name: name.into(),
            phone: None,
            office_email: None,
            street: None,
            city: None,
            state: None,
            zip: None,
            county: None,
            lat: None,
            lng: None,
            price_class: None,
            property_type: None,
            fee_managed: None,
            unit_count,
            owner_name: None,
            management_company_id: None,
            regional_manager_id: None,
            property_manager_id: None,
            status: PropertyStatus::Lead,
            status_history: Vec::new(),
            change_log: Vec::new(),
            notes: Vec::new(),
            attachments: Vec::new(),
            created_by,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Request to look up a property by its ALN id
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPropertyRequest {
    pub external_id: String,
}

/// Request to move a property to another pipeline stage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePropertyStatusRequest {
    pub external_id: String,
    pub status: PropertyStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_to_display_name() {
        let json = serde_json::to_string(&PropertyStatus::CurrentClient).unwrap();
        assert_eq!(json, "\"Current Client\"");
    }

    #[test]
    fn test_status_parses_case_insensitively() {
        assert_eq!("sales working".parse::<PropertyStatus>().unwrap(), PropertyStatus::SalesWorking);
        assert_eq!(" Lead ".parse::<PropertyStatus>().unwrap(), PropertyStatus::Lead);
        assert!("Closed".parse::<PropertyStatus>().is_err());
    }

    #[test]
    fn test_new_property_starts_as_lead_with_empty_history() {
        let property = Property::new("X1", "Oak Apts", 50, Uuid::nil());
        assert_eq!(property.status, PropertyStatus::Lead);
        assert!(property.change_log.is_empty());
        assert!(property.status_history.is_empty());
        assert!(property.management_company_id.is_none());
    }

    #[test]
    fn test_update_status_request_deserializes_from_camel_case() {
        let json = r#"{"externalId":"X1","status":"Contract Signed"}"#;
        let request: UpdatePropertyStatusRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.external_id, "X1");
        assert_eq!(request.status, PropertyStatus::ContractSigned);
    }

    #[test]
    fn test_change_log_entry_serializes_camel_case() {
        let entry = ChangeLogEntry {
            timestamp: Utc::now(),
            changes: vec!["Management Company changed from A to B".to_string()],
            uploaded_by: Uuid::nil(),
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("uploadedBy"));
        assert!(!json.contains("uploaded_by"));
    }
}
