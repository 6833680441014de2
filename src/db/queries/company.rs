//! Company database queries

use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use crate::types::Company;

const COMPANY_COLUMNS: &str = r#"
    id, name, company_type, phone, website,
    street, city, state, zip,
    created_by, created_at, updated_at
"#;

/// Find a company by exact (case-sensitive) name
pub async fn find_company_by_name(pool: &PgPool, name: &str) -> Result<Option<Company>> {
    let company = sqlx::query_as::<_, Company>(&format!(
        "SELECT {} FROM companies WHERE name = $1 ORDER BY created_at ASC LIMIT 1",
        COMPANY_COLUMNS
    ))
    .bind(name)
    .fetch_optional(pool)
    .await?;

    Ok(company)
}

/// Get company by ID
pub async fn get_company(pool: &PgPool, company_id: Uuid) -> Result<Option<Company>> {
    let company = sqlx::query_as::<_, Company>(&format!(
        "SELECT {} FROM companies WHERE id = $1",
        COMPANY_COLUMNS
    ))
    .bind(company_id)
    .fetch_optional(pool)
    .await?;

    Ok(company)
}

/// Insert a new company
pub async fn insert_company(pool: &PgPool, company: &Company) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO companies (
            id, name, company_type, phone, website,
            street, city, state, zip,
            created_by, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
    )
    .bind(company.id)
    .bind(&company.name)
    .bind(&company.company_type)
    .bind(&company.phone)
    .bind(&company.website)
    .bind(&company.street)
    .bind(&company.city)
    .bind(&company.state)
    .bind(&company.zip)
    .bind(company.created_by)
    .bind(company.created_at)
    .bind(company.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Overwrite the mutable fields of a company
pub async fn save_company(pool: &PgPool, company: &Company) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE companies
        SET company_type = $2,
            phone = $3,
            website = $4,
            street = $5,
            city = $6,
            state = $7,
            zip = $8,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(company.id)
    .bind(&company.company_type)
    .bind(&company.phone)
    .bind(&company.website)
    .bind(&company.street)
    .bind(&company.city)
    .bind(&company.state)
    .bind(&company.zip)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        anyhow::bail!("Company {} not found", company.id);
    }
    Ok(())
}
