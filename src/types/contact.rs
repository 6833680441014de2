//! Contact types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const TITLE_AREA_SUPERVISOR: &str = "Area Supervisor";
pub const TITLE_PROPERTY_MANAGER: &str = "Property Manager";

/// Free-form note attached to a contact or property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub author: Option<Uuid>,
}

impl Note {
    pub fn new(content: impl Into<String>, author: Uuid) -> Self {
        Self {
            content: content.into(),
            timestamp: Utc::now(),
            author: Some(author),
        }
    }
}

/// Contact entity (area supervisors, property managers)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub title: Option<String>,
    pub company_id: Option<Uuid>,
    pub property_id: Option<Uuid>,
    #[sqlx(json)]
    pub notes: Vec<Note>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contact {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>, created_by: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: None,
            phone: None,
            title: None,
            company_id: None,
            property_id: None,
            notes: Vec::new(),
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Sets the title unless one is already present
    pub fn fill_title(&mut self, title: &str) -> bool {
        if self.title.as_deref().map_or(true, |t| t.trim().is_empty()) {
            self.title = Some(title.to_string());
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_title_only_when_blank() {
        let mut contact = Contact::new("Jane", "Doe", Uuid::nil());
        assert!(contact.fill_title(TITLE_PROPERTY_MANAGER));
        assert!(!contact.fill_title(TITLE_AREA_SUPERVISOR));
        assert_eq!(contact.title.as_deref(), Some(TITLE_PROPERTY_MANAGER));
    }

    #[test]
    fn test_fill_title_replaces_whitespace_title() {
        let mut contact = Contact::new("Jane", "Doe", Uuid::nil());
        contact.title = Some("  ".to_string());
        assert!(contact.fill_title(TITLE_AREA_SUPERVISOR));
        assert_eq!(contact.title.as_deref(), Some(TITLE_AREA_SUPERVISOR));
    }

    #[test]
    fn test_full_name() {
        let contact = Contact::new("Mary", "Ann Smith", Uuid::nil());
        assert_eq!(contact.full_name(), "Mary Ann Smith");
    }
}
