//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for CRM records.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository writes must validate records before persistence.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.
//! - Repositories only accept connections with the latest schema applied.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::client::ClientValidationError;
use crate::model::matching::MatchScoreOutOfRange;
use crate::model::property::PropertyValidationError;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod client_repo;
pub mod match_repo;
pub mod property_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Record family a repository error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Property,
    Client,
    Match,
}

impl Entity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Property => "property",
            Self::Client => "client",
            Self::Match => "match",
        }
    }
}

/// Repository error shared by property, client and match persistence.
#[derive(Debug)]
pub enum RepoError {
    InvalidProperty(PropertyValidationError),
    InvalidClient(ClientValidationError),
    InvalidScore(MatchScoreOutOfRange),
    Db(DbError),
    NotFound(Entity, Uuid),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidProperty(err) => write!(f, "{err}"),
            Self::InvalidClient(err) => write!(f, "{err}"),
            Self::InvalidScore(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(entity, id) => write!(f, "{} not found: {id}", entity.as_str()),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table missing: {table}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidProperty(err) => Some(err),
            Self::InvalidClient(err) => Some(err),
            Self::InvalidScore(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(..)
            | Self::InvalidData(_)
            | Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_) => None,
        }
    }
}

impl From<PropertyValidationError> for RepoError {
    fn from(value: PropertyValidationError) -> Self {
        Self::InvalidProperty(value)
    }
}

impl From<ClientValidationError> for RepoError {
    fn from(value: ClientValidationError) -> Self {
        Self::InvalidClient(value)
    }
}

impl From<MatchScoreOutOfRange> for RepoError {
    fn from(value: MatchScoreOutOfRange) -> Self {
        Self::InvalidScore(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Status filter used by dashboard counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusPredicate<S> {
    Any,
    Is(S),
    IsNot(S),
}

impl<S: Copy> StatusPredicate<S> {
    /// Returns a `WHERE`-ready clause over `status` and its bind value.
    pub(crate) fn sql_clause(
        self,
        to_db: fn(S) -> &'static str,
    ) -> (&'static str, Option<&'static str>) {
        match self {
            Self::Any => ("1 = 1", None),
            Self::Is(status) => ("status = ?1", Some(to_db(status))),
            Self::IsNot(status) => ("status <> ?1", Some(to_db(status))),
        }
    }
}

/// Verifies the connection was opened through `db::open_db*`.
pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    tables: &[&'static str],
) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in tables {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

pub(crate) fn parse_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
