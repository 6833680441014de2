//! Company types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const DEFAULT_COMPANY_TYPE: &str = "Management Company";

/// Company entity (management companies referenced by properties)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    #[sqlx(rename = "company_type")]
    #[serde(rename = "type")]
    pub company_type: String,
    pub phone: Option<String>,
    pub website: Option<String>,

    // Address
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,

    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Company {
    pub fn new(name: impl Into<String>, created_by: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            company_type: DEFAULT_COMPANY_TYPE.to_string(),
            phone: None,
            website: None,
            street: None,
            city: None,
            state: None,
            zip: None,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }
}
