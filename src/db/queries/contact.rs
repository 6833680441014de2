//! Contact database queries

use anyhow::Result;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::types::Contact;

const CONTACT_COLUMNS: &str = r#"
    id, first_name, last_name, email, phone, title,
    company_id, property_id, notes,
    created_by, created_at, updated_at
"#;

/// Find a contact by exact email
pub async fn find_contact_by_email(pool: &PgPool, email: &str) -> Result<Option<Contact>> {
    let contact = sqlx::query_as::<_, Contact>(&format!(
        "SELECT {} FROM contacts WHERE email = $1 ORDER BY created_at ASC LIMIT 1",
        CONTACT_COLUMNS
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(contact)
}

/// Find a contact by case-insensitive first and last name.
///
/// `company_id = None` searches across all companies.
pub async fn find_contact_by_name(
    pool: &PgPool,
    first_name: &str,
    last_name: &str,
    company_id: Option<Uuid>,
) -> Result<Option<Contact>> {
    let contact = sqlx::query_as::<_, Contact>(&format!(
        r#"
        SELECT {} FROM contacts
        WHERE LOWER(first_name) = LOWER($1)
          AND LOWER(last_name) = LOWER($2)
          AND ($3::uuid IS NULL OR company_id = $3)
        ORDER BY created_at ASC
        LIMIT 1
        "#,
        CONTACT_COLUMNS
    ))
    .bind(first_name)
    .bind(last_name)
    .bind(company_id)
    .fetch_optional(pool)
    .await?;

    Ok(contact)
}

/// Get contact by ID
pub async fn get_contact(pool: &PgPool, contact_id: Uuid) -> Result<Option<Contact>> {
    let contact = sqlx::query_as::<_, Contact>(&format!(
        "SELECT {} FROM contacts WHERE id = $1",
        CONTACT_COLUMNS
    ))
    .bind(contact_id)
    .fetch_optional(pool)
    .await?;

    Ok(contact)
}

/// Contacts linked to both a company and a property
pub async fn list_contacts_for_company_property(
    pool: &PgPool,
    company_id: Uuid,
    property_id: Uuid,
) -> Result<Vec<Contact>> {
    let contacts = sqlx::query_as::<_, Contact>(&format!(
        r#"
        SELECT {} FROM contacts
        WHERE company_id = $1 AND property_id = $2
        ORDER BY created_at ASC
        "#,
        CONTACT_COLUMNS
    ))
    .bind(company_id)
    .bind(property_id)
    .fetch_all(pool)
    .await?;

    Ok(contacts)
}

/// Insert a new contact
pub async fn insert_contact(pool: &PgPool, contact: &Contact) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO contacts (
            id, first_name, last_name, email, phone, title,
            company_id, property_id, notes,
            created_by, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
    )
    .bind(contact.id)
    .bind(&contact.first_name)
    .bind(&contact.last_name)
    .bind(&contact.email)
    .bind(&contact.phone)
    .bind(&contact.title)
    .bind(contact.company_id)
    .bind(contact.property_id)
    .bind(Json(&contact.notes))
    .bind(contact.created_by)
    .bind(contact.created_at)
    .bind(contact.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Overwrite the mutable fields of a contact
pub async fn save_contact(pool: &PgPool, contact: &Contact) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE contacts
        SET first_name = $2,
            last_name = $3,
            email = $4,
            phone = $5,
            title = $6,
            company_id = $7,
            property_id = $8,
            notes = $9,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(contact.id)
    .bind(&contact.first_name)
    .bind(&contact.last_name)
    .bind(&contact.email)
    .bind(&contact.phone)
    .bind(&contact.title)
    .bind(contact.company_id)
    .bind(contact.property_id)
    .bind(Json(&contact.notes))
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        anyhow::bail!("Contact {} not found", contact.id);
    }
    Ok(())
}
