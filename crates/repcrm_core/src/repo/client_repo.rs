//! Client repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over `clients` and its preference tables.
//! - Own preference-list replacement with atomic semantics.
//!
//! # Invariants
//! - `client_property_types` and `client_regions` are replaced as whole sets
//!   together with the client row.
//! - List order is `created_at DESC, id ASC`.

use crate::currency::Money;
use crate::model::client::{Client, ClientId, ClientStatus, ClientType};
use crate::model::property::PropertyType;
use crate::repo::{
    bool_to_int, ensure_connection_ready, parse_bool, parse_uuid, Entity, RepoError, RepoResult,
    StatusPredicate,
};
use rusqlite::{params, Connection, Row, Transaction};

const CLIENT_SELECT_SQL: &str = "SELECT
    id,
    name,
    phone,
    type,
    max_purchase_value_cents,
    has_property_for_transfer,
    status,
    notes,
    user_id,
    created_at,
    updated_at
FROM clients";

/// Repository interface for client CRUD operations.
pub trait ClientRepository {
    fn create_client(&self, client: &Client) -> RepoResult<ClientId>;
    fn update_client(&self, client: &Client) -> RepoResult<()>;
    fn get_client(&self, id: ClientId) -> RepoResult<Option<Client>>;
    fn list_clients(&self) -> RepoResult<Vec<Client>>;
    /// Hard-deletes a client; preferences and matches cascade.
    fn delete_client(&self, id: ClientId) -> RepoResult<()>;
    fn count_clients(&self, status: StatusPredicate<ClientStatus>) -> RepoResult<u64>;
}

/// SQLite-backed client repository.
pub struct SqliteClientRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteClientRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &["clients", "client_property_types", "client_regions"],
        )?;
        Ok(Self { conn })
    }
}

impl ClientRepository for SqliteClientRepository<'_> {
    fn create_client(&self, client: &Client) -> RepoResult<ClientId> {
        client.validate()?;

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO clients (
                id,
                name,
                phone,
                type,
                max_purchase_value_cents,
                has_property_for_transfer,
                status,
                notes,
                user_id,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);",
            params![
                client.id.to_string(),
                client.name.as_str(),
                client.phone.as_str(),
                client.kind.as_str(),
                client.max_purchase_value.map(Money::cents),
                bool_to_int(client.has_property_for_transfer),
                client.status.as_str(),
                client.notes.as_deref(),
                client.user_id.to_string(),
                client.created_at,
                client.updated_at,
            ],
        )?;
        replace_preferences(&tx, client)?;
        tx.commit()?;

        Ok(client.id)
    }

    fn update_client(&self, client: &Client) -> RepoResult<()> {
        client.validate()?;

        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE clients
             SET
                name = ?1,
                phone = ?2,
                type = ?3,
                max_purchase_value_cents = ?4,
                has_property_for_transfer = ?5,
                status = ?6,
                notes = ?7,
                updated_at = ?8
             WHERE id = ?9;",
            params![
                client.name.as_str(),
                client.phone.as_str(),
                client.kind.as_str(),
                client.max_purchase_value.map(Money::cents),
                bool_to_int(client.has_property_for_transfer),
                client.status.as_str(),
                client.notes.as_deref(),
                client.updated_at,
                client.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(Entity::Client, client.id));
        }

        replace_preferences(&tx, client)?;
        tx.commit()?;
        Ok(())
    }

    fn get_client(&self, id: ClientId) -> RepoResult<Option<Client>> {
        let sql = format!("{CLIENT_SELECT_SQL} WHERE id = ?1;");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([id.to_string()])?;

        if let Some(row) = rows.next()? {
            let mut client = parse_client_row(row)?;
            load_preferences(self.conn, &mut client)?;
            return Ok(Some(client));
        }

        Ok(None)
    }

    fn list_clients(&self) -> RepoResult<Vec<Client>> {
        let sql = format!("{CLIENT_SELECT_SQL} ORDER BY created_at DESC, id ASC;");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut clients = Vec::new();

        while let Some(row) = rows.next()? {
            let mut client = parse_client_row(row)?;
            load_preferences(self.conn, &mut client)?;
            clients.push(client);
        }

        Ok(clients)
    }

    fn delete_client(&self, id: ClientId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM clients WHERE id = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(Entity::Client, id));
        }

        Ok(())
    }

    fn count_clients(&self, status: StatusPredicate<ClientStatus>) -> RepoResult<u64> {
        let (clause, value) = status.sql_clause(ClientStatus::as_str);
        let sql = format!("SELECT COUNT(*) FROM clients WHERE {clause};");
        let count: i64 = match value {
            Some(value) => self.conn.query_row(&sql, [value], |row| row.get(0))?,
            None => self.conn.query_row(&sql, [], |row| row.get(0))?,
        };
        Ok(count.max(0) as u64)
    }
}

fn replace_preferences(tx: &Transaction<'_>, client: &Client) -> RepoResult<()> {
    let id = client.id.to_string();
    tx.execute(
        "DELETE FROM client_property_types WHERE client_id = ?1;",
        [id.as_str()],
    )?;
    tx.execute("DELETE FROM client_regions WHERE client_id = ?1;", [id.as_str()])?;

    for (position, kind) in client.desired_property_types.iter().enumerate() {
        tx.execute(
            "INSERT INTO client_property_types (client_id, position, property_type)
             VALUES (?1, ?2, ?3);",
            params![id.as_str(), position as i64, kind.as_str()],
        )?;
    }

    for (position, region) in client.regions_of_interest.iter().enumerate() {
        tx.execute(
            "INSERT INTO client_regions (client_id, position, region)
             VALUES (?1, ?2, ?3);",
            params![id.as_str(), position as i64, region.as_str()],
        )?;
    }

    Ok(())
}

fn load_preferences(conn: &Connection, client: &mut Client) -> RepoResult<()> {
    let id = client.id.to_string();

    let mut stmt = conn.prepare(
        "SELECT property_type
         FROM client_property_types
         WHERE client_id = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([id.as_str()])?;
    let mut types = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        let kind = PropertyType::parse(&value).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid property type `{value}` in client_property_types.property_type"
            ))
        })?;
        types.push(kind);
    }

    let mut stmt = conn.prepare(
        "SELECT region
         FROM client_regions
         WHERE client_id = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([id.as_str()])?;
    let mut regions = Vec::new();
    while let Some(row) = rows.next()? {
        regions.push(row.get::<_, String>(0)?);
    }

    client.desired_property_types = types;
    client.regions_of_interest = regions;
    Ok(())
}

fn parse_client_row(row: &Row<'_>) -> RepoResult<Client> {
    let id_text: String = row.get("id")?;
    let id = parse_uuid(&id_text, "clients.id")?;

    let type_text: String = row.get("type")?;
    let kind = ClientType::parse(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid client type `{type_text}` in clients.type"))
    })?;

    let status_text: String = row.get("status")?;
    let status = ClientStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid client status `{status_text}` in clients.status"
        ))
    })?;

    let user_text: String = row.get("user_id")?;
    let user_id = parse_uuid(&user_text, "clients.user_id")?;

    let client = Client {
        id,
        name: row.get("name")?,
        phone: row.get("phone")?,
        kind,
        max_purchase_value: row
            .get::<_, Option<i64>>("max_purchase_value_cents")?
            .map(Money::from_cents),
        desired_property_types: Vec::new(),
        regions_of_interest: Vec::new(),
        has_property_for_transfer: parse_bool(
            row.get("has_property_for_transfer")?,
            "clients.has_property_for_transfer",
        )?,
        status,
        notes: row.get("notes")?,
        user_id,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    client.validate()?;
    Ok(client)
}
