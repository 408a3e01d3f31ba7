//! Property repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over `properties` and its ordered `property_media`.
//! - Keep SQL details inside core persistence boundary.
//!
//! # Invariants
//! - Write paths call `Property::validate()` before SQL mutations.
//! - Media rows are replaced as a whole inside the same transaction as the
//!   property row, so readers never see a half-written gallery.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::currency::Money;
use crate::model::media::{MediaKind, PropertyMedia};
use crate::model::property::{Property, PropertyId, PropertyStatus, PropertyType};
use crate::repo::{
    ensure_connection_ready, parse_uuid, Entity, RepoError, RepoResult, StatusPredicate,
};
use rusqlite::{params, Connection, Row, Transaction};

const PROPERTY_SELECT_SQL: &str = "SELECT
    id,
    type,
    street,
    neighborhood,
    city,
    state,
    region,
    transfer_value_cents,
    monthly_payment_cents,
    outstanding_balance_cents,
    bank_constructor,
    owner_name,
    owner_phone,
    status,
    notes,
    user_id,
    created_at,
    updated_at
FROM properties";

/// Repository interface for property CRUD operations.
pub trait PropertyRepository {
    fn create_property(&self, property: &Property) -> RepoResult<PropertyId>;
    /// Replaces every column and the media lists of an existing property.
    fn update_property(&self, property: &Property) -> RepoResult<()>;
    fn get_property(&self, id: PropertyId) -> RepoResult<Option<Property>>;
    /// Lists all properties, newest first.
    fn list_properties(&self) -> RepoResult<Vec<Property>>;
    /// Hard-deletes a property; dependent media and matches cascade.
    fn delete_property(&self, id: PropertyId) -> RepoResult<()>;
    fn count_properties(&self, status: StatusPredicate<PropertyStatus>) -> RepoResult<u64>;
}

/// SQLite-backed property repository.
pub struct SqlitePropertyRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePropertyRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["properties", "property_media"])?;
        Ok(Self { conn })
    }
}

impl PropertyRepository for SqlitePropertyRepository<'_> {
    fn create_property(&self, property: &Property) -> RepoResult<PropertyId> {
        property.validate()?;

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO properties (
                id,
                type,
                street,
                neighborhood,
                city,
                state,
                region,
                transfer_value_cents,
                monthly_payment_cents,
                outstanding_balance_cents,
                bank_constructor,
                owner_name,
                owner_phone,
                status,
                notes,
                user_id,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18);",
            params![
                property.id.to_string(),
                property.kind.as_str(),
                property.street.as_str(),
                property.neighborhood.as_deref(),
                property.city.as_str(),
                property.state.as_str(),
                property.region.as_str(),
                property.transfer_value.cents(),
                property.monthly_payment.map(Money::cents),
                property.outstanding_balance.map(Money::cents),
                property.bank_constructor.as_deref(),
                property.owner_name.as_deref(),
                property.owner_phone.as_deref(),
                property.status.as_str(),
                property.notes.as_deref(),
                property.user_id.to_string(),
                property.created_at,
                property.updated_at,
            ],
        )?;
        replace_media(&tx, property.id, &property.media)?;
        tx.commit()?;

        Ok(property.id)
    }

    fn update_property(&self, property: &Property) -> RepoResult<()> {
        property.validate()?;

        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE properties
             SET
                type = ?1,
                street = ?2,
                neighborhood = ?3,
                city = ?4,
                state = ?5,
                region = ?6,
                transfer_value_cents = ?7,
                monthly_payment_cents = ?8,
                outstanding_balance_cents = ?9,
                bank_constructor = ?10,
                owner_name = ?11,
                owner_phone = ?12,
                status = ?13,
                notes = ?14,
                updated_at = ?15
             WHERE id = ?16;",
            params![
                property.kind.as_str(),
                property.street.as_str(),
                property.neighborhood.as_deref(),
                property.city.as_str(),
                property.state.as_str(),
                property.region.as_str(),
                property.transfer_value.cents(),
                property.monthly_payment.map(Money::cents),
                property.outstanding_balance.map(Money::cents),
                property.bank_constructor.as_deref(),
                property.owner_name.as_deref(),
                property.owner_phone.as_deref(),
                property.status.as_str(),
                property.notes.as_deref(),
                property.updated_at,
                property.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(Entity::Property, property.id));
        }

        replace_media(&tx, property.id, &property.media)?;
        tx.commit()?;
        Ok(())
    }

    fn get_property(&self, id: PropertyId) -> RepoResult<Option<Property>> {
        let sql = format!("{PROPERTY_SELECT_SQL} WHERE id = ?1;");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([id.to_string()])?;

        if let Some(row) = rows.next()? {
            let mut property = parse_property_row(row)?;
            property.media = load_media(self.conn, &id.to_string())?;
            return Ok(Some(property));
        }

        Ok(None)
    }

    fn list_properties(&self) -> RepoResult<Vec<Property>> {
        let sql = format!("{PROPERTY_SELECT_SQL} ORDER BY created_at DESC, id ASC;");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut properties = Vec::new();

        while let Some(row) = rows.next()? {
            let mut property = parse_property_row(row)?;
            property.media = load_media(self.conn, &property.id.to_string())?;
            properties.push(property);
        }

        Ok(properties)
    }

    fn delete_property(&self, id: PropertyId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM properties WHERE id = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(Entity::Property, id));
        }

        Ok(())
    }

    fn count_properties(&self, status: StatusPredicate<PropertyStatus>) -> RepoResult<u64> {
        let (clause, value) = status.sql_clause(PropertyStatus::as_str);
        let sql = format!("SELECT COUNT(*) FROM properties WHERE {clause};");
        let count: i64 = match value {
            Some(value) => self.conn.query_row(&sql, [value], |row| row.get(0))?,
            None => self.conn.query_row(&sql, [], |row| row.get(0))?,
        };
        Ok(count.max(0) as u64)
    }
}

fn replace_media(
    tx: &Transaction<'_>,
    property_id: PropertyId,
    media: &PropertyMedia,
) -> RepoResult<()> {
    let id = property_id.to_string();
    tx.execute("DELETE FROM property_media WHERE property_id = ?1;", [id.as_str()])?;

    let mut insert = tx.prepare(
        "INSERT INTO property_media (property_id, kind, position, url)
         VALUES (?1, ?2, ?3, ?4);",
    )?;
    for (kind, urls) in [
        (MediaKind::Photo, &media.photos),
        (MediaKind::Video, &media.videos),
    ] {
        for (position, url) in urls.iter().enumerate() {
            insert.execute(params![id.as_str(), kind.as_str(), position as i64, url])?;
        }
    }

    Ok(())
}

fn load_media(conn: &Connection, property_id: &str) -> RepoResult<PropertyMedia> {
    let mut stmt = conn.prepare(
        "SELECT kind, url
         FROM property_media
         WHERE property_id = ?1
         ORDER BY kind ASC, position ASC;",
    )?;
    let mut rows = stmt.query([property_id])?;
    let mut media = PropertyMedia::default();

    while let Some(row) = rows.next()? {
        let kind_text: String = row.get("kind")?;
        let url: String = row.get("url")?;
        match MediaKind::parse(&kind_text) {
            Some(MediaKind::Photo) => media.photos.push(url),
            Some(MediaKind::Video) => media.videos.push(url),
            None => {
                return Err(RepoError::InvalidData(format!(
                    "invalid media kind `{kind_text}` in property_media.kind"
                )));
            }
        }
    }

    Ok(media)
}

fn parse_property_row(row: &Row<'_>) -> RepoResult<Property> {
    let id_text: String = row.get("id")?;
    let id = parse_uuid(&id_text, "properties.id")?;

    let type_text: String = row.get("type")?;
    let kind = PropertyType::parse(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid property type `{type_text}` in properties.type"))
    })?;

    let status_text: String = row.get("status")?;
    let status = PropertyStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid property status `{status_text}` in properties.status"
        ))
    })?;

    let user_text: String = row.get("user_id")?;
    let user_id = parse_uuid(&user_text, "properties.user_id")?;

    let property = Property {
        id,
        kind,
        street: row.get("street")?,
        neighborhood: row.get("neighborhood")?,
        city: row.get("city")?,
        state: row.get("state")?,
        region: row.get("region")?,
        transfer_value: Money::from_cents(row.get("transfer_value_cents")?),
        monthly_payment: row
            .get::<_, Option<i64>>("monthly_payment_cents")?
            .map(Money::from_cents),
        outstanding_balance: row
            .get::<_, Option<i64>>("outstanding_balance_cents")?
            .map(Money::from_cents),
        bank_constructor: row.get("bank_constructor")?,
        owner_name: row.get("owner_name")?,
        owner_phone: row.get("owner_phone")?,
        status,
        notes: row.get("notes")?,
        media: PropertyMedia::default(),
        user_id,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    property.validate()?;
    Ok(property)
}
