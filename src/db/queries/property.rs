//! Property database queries

use anyhow::Result;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::types::Property;

const PROPERTY_COLUMNS: &str = r#"
    id, external_id, name, phone, office_email,
    street, city, state, zip, county,
    lat, lng,
    price_class, property_type, fee_managed, unit_count, owner_name,
    management_company_id, regional_manager_id, property_manager_id,
    status, status_history, change_log, notes, attachments,
    created_by, created_at, updated_at
"#;

/// Find a property by its ALN id
pub async fn find_property_by_external_id(pool: &PgPool, external_id: &str) -> Result<Option<Property>> {
    let property = sqlx::query_as::<_, Property>(&format!(
        "SELECT {} FROM properties WHERE external_id = $1",
        PROPERTY_COLUMNS
    ))
    .bind(external_id)
    .fetch_optional(pool)
    .await?;

    Ok(property)
}

/// Insert a new property
pub async fn insert_property(pool: &PgPool, property: &Property) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO properties (
            id, external_id, name, phone, office_email,
            street, city, state, zip, county,
            lat, lng,
            price_class, property_type, fee_managed, unit_count, owner_name,
            management_company_id, regional_manager_id, property_manager_id,
            status, status_history, change_log, notes, attachments,
            created_by, created_at, updated_at
        )
        VALUES (
            $1, $2, $3, $4, $5,
            $6, $7, $8, $9, $10,
            $11, $12,
            $13, $14, $15, $16, $17,
            $18, $19, $20,
            $21, $22, $23, $24, $25,
            $26, $27, $28
        )
        "#,
    )
    .bind(property.id)
    .bind(&property.external_id)
    .bind(&property.name)
    .bind(&property.phone)
    .bind(&property.office_email)
    .bind(&property.street)
    .bind(&property.city)
    .bind(&property.state)
    .bind(&property.zip)
    .bind(&property.county)
    .bind(property.lat)
    .bind(property.lng)
    .bind(&property.price_class)
    .bind(&property.property_type)
    .bind(&property.fee_managed)
    .bind(property.unit_count)
    .bind(&property.owner_name)
    .bind(property.management_company_id)
    .bind(property.regional_manager_id)
    .bind(property.property_manager_id)
    .bind(property.status)
    .bind(Json(&property.status_history))
    .bind(Json(&property.change_log))
    .bind(Json(&property.notes))
    .bind(Json(&property.attachments))
    .bind(property.created_by)
    .bind(property.created_at)
    .bind(property.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Overwrite every mutable field of a property (external_id is immutable)
pub async fn save_property(pool: &PgPool, property: &Property) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE properties
        SET name = $2,
            phone = $3,
            office_email = $4,
            street = $5,
            city = $6,
            state = $7,
            zip = $8,
            county = $9,
            lat = $10,
            lng = $11,
            price_class = $12,
            property_type = $13,
            fee_managed = $14,
            unit_count = $15,
            owner_name = $16,
            management_company_id = $17,
            regional_manager_id = $18,
            property_manager_id = $19,
            status = $20,
            status_history = $21,
            change_log = $22,
            notes = $23,
            attachments = $24,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(property.id)
    .bind(&property.name)
    .bind(&property.phone)
    .bind(&property.office_email)
    .bind(&property.street)
    .bind(&property.city)
    .bind(&property.state)
    .bind(&property.zip)
    .bind(&property.county)
    .bind(property.lat)
    .bind(property.lng)
    .bind(&property.price_class)
    .bind(&property.property_type)
    .bind(&property.fee_managed)
    .bind(property.unit_count)
    .bind(&property.owner_name)
    .bind(property.management_company_id)
    .bind(property.regional_manager_id)
    .bind(property.property_manager_id)
    .bind(property.status)
    .bind(Json(&property.status_history))
    .bind(Json(&property.change_log))
    .bind(Json(&property.notes))
    .bind(Json(&property.attachments))
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        anyhow::bail!("Property {} not found", property.external_id);
    }
    Ok(())
}
