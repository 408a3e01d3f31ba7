//! Match repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Ingest externally scored matches (`upsert_match`).
//! - Serve the match list with joined client/property rows.
//! - Track viewed/negotiation state and dashboard counters.
//!
//! # Invariants
//! - One row per (client, property); re-ingestion refreshes the score only.
//! - Any status change also marks the match as viewed.

use crate::model::client::ClientId;
use crate::model::matching::{
    Match, MatchId, MatchScoreOutOfRange, MatchStatus, MatchWithDetails, MAX_MATCH_SCORE,
};
use crate::repo::client_repo::{ClientRepository, SqliteClientRepository};
use crate::repo::property_repo::{PropertyRepository, SqlitePropertyRepository};
use crate::repo::{
    bool_to_int, ensure_connection_ready, parse_bool, parse_uuid, Entity, RepoError, RepoResult,
    StatusPredicate,
};
use rusqlite::{params, Connection, OptionalExtension, Row};

const MATCH_SELECT_SQL: &str = "SELECT
    id,
    client_id,
    property_id,
    match_score,
    is_viewed,
    status,
    created_at
FROM matches";

/// Repository interface for match operations.
pub trait MatchRepository {
    /// Inserts a match or refreshes the score of the existing pair.
    ///
    /// Returns the id of the stored row (the existing one on conflict).
    fn upsert_match(&self, record: &Match) -> RepoResult<MatchId>;
    fn get_match(&self, id: MatchId) -> RepoResult<Option<Match>>;
    /// Lists matches newest first with client/property joins.
    fn list_matches(&self) -> RepoResult<Vec<MatchWithDetails>>;
    fn list_matches_for_client(&self, client_id: ClientId) -> RepoResult<Vec<MatchWithDetails>>;
    fn count_unviewed(&self) -> RepoResult<u64>;
    fn count_matches(&self, status: StatusPredicate<MatchStatus>) -> RepoResult<u64>;
    fn count_created_since(&self, since_ms: i64) -> RepoResult<u64>;
    fn mark_viewed(&self, id: MatchId) -> RepoResult<()>;
    fn update_status(&self, id: MatchId, status: MatchStatus) -> RepoResult<()>;
    fn delete_match(&self, id: MatchId) -> RepoResult<()>;
}

/// SQLite-backed match repository.
pub struct SqliteMatchRepository<'conn> {
    conn: &'conn Connection,
    clients: SqliteClientRepository<'conn>,
    properties: SqlitePropertyRepository<'conn>,
}

impl<'conn> SqliteMatchRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["matches"])?;
        Ok(Self {
            conn,
            clients: SqliteClientRepository::try_new(conn)?,
            properties: SqlitePropertyRepository::try_new(conn)?,
        })
    }

    fn query_with_details(
        &self,
        sql: &str,
        client_id: Option<String>,
    ) -> RepoResult<Vec<MatchWithDetails>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = match client_id {
            Some(id) => stmt.query([id])?,
            None => stmt.query([])?,
        };
        let mut matches = Vec::new();

        while let Some(row) = rows.next()? {
            let record = parse_match_row(row)?;
            let client = self.clients.get_client(record.client_id)?;
            let property = self.properties.get_property(record.property_id)?;
            matches.push(MatchWithDetails {
                record,
                client,
                property,
            });
        }

        Ok(matches)
    }

    fn count(&self, sql: &str, value: Option<&str>) -> RepoResult<u64> {
        let count: i64 = match value {
            Some(value) => self.conn.query_row(sql, [value], |row| row.get(0))?,
            None => self.conn.query_row(sql, [], |row| row.get(0))?,
        };
        Ok(count.max(0) as u64)
    }
}

impl MatchRepository for SqliteMatchRepository<'_> {
    fn upsert_match(&self, record: &Match) -> RepoResult<MatchId> {
        if record.match_score > MAX_MATCH_SCORE {
            return Err(MatchScoreOutOfRange(u32::from(record.match_score)).into());
        }

        self.conn.execute(
            "INSERT INTO matches (
                id,
                client_id,
                property_id,
                match_score,
                is_viewed,
                status,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT (client_id, property_id)
            DO UPDATE SET match_score = excluded.match_score;",
            params![
                record.id.to_string(),
                record.client_id.to_string(),
                record.property_id.to_string(),
                i64::from(record.match_score),
                bool_to_int(record.is_viewed),
                record.status.as_str(),
                record.created_at,
            ],
        )?;

        let stored: String = self.conn.query_row(
            "SELECT id FROM matches WHERE client_id = ?1 AND property_id = ?2;",
            params![record.client_id.to_string(), record.property_id.to_string()],
            |row| row.get(0),
        )?;
        parse_uuid(&stored, "matches.id")
    }

    fn get_match(&self, id: MatchId) -> RepoResult<Option<Match>> {
        let sql = format!("{MATCH_SELECT_SQL} WHERE id = ?1;");
        let row = self
            .conn
            .query_row(&sql, [id.to_string()], |row| Ok(parse_match_row(row)))
            .optional()?;
        row.transpose()
    }

    fn list_matches(&self) -> RepoResult<Vec<MatchWithDetails>> {
        let sql = format!("{MATCH_SELECT_SQL} ORDER BY created_at DESC, id ASC;");
        self.query_with_details(&sql, None)
    }

    fn list_matches_for_client(&self, client_id: ClientId) -> RepoResult<Vec<MatchWithDetails>> {
        let sql =
            format!("{MATCH_SELECT_SQL} WHERE client_id = ?1 ORDER BY created_at DESC, id ASC;");
        self.query_with_details(&sql, Some(client_id.to_string()))
    }

    fn count_unviewed(&self) -> RepoResult<u64> {
        self.count("SELECT COUNT(*) FROM matches WHERE is_viewed = 0;", None)
    }

    fn count_matches(&self, status: StatusPredicate<MatchStatus>) -> RepoResult<u64> {
        let (clause, value) = status.sql_clause(MatchStatus::as_str);
        let sql = format!("SELECT COUNT(*) FROM matches WHERE {clause};");
        self.count(&sql, value)
    }

    fn count_created_since(&self, since_ms: i64) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM matches WHERE created_at >= ?1;",
            [since_ms],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    fn mark_viewed(&self, id: MatchId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE matches SET is_viewed = 1 WHERE id = ?1;",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(Entity::Match, id));
        }
        Ok(())
    }

    fn update_status(&self, id: MatchId, status: MatchStatus) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE matches SET status = ?1, is_viewed = 1 WHERE id = ?2;",
            params![status.as_str(), id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(Entity::Match, id));
        }
        Ok(())
    }

    fn delete_match(&self, id: MatchId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM matches WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(Entity::Match, id));
        }
        Ok(())
    }
}

fn parse_match_row(row: &Row<'_>) -> RepoResult<Match> {
    let id_text: String = row.get("id")?;
    let client_text: String = row.get("client_id")?;
    let property_text: String = row.get("property_id")?;

    let score: i64 = row.get("match_score")?;
    let match_score = u8::try_from(score)
        .ok()
        .filter(|value| *value <= MAX_MATCH_SCORE)
        .ok_or_else(|| {
            RepoError::InvalidData(format!("invalid score `{score}` in matches.match_score"))
        })?;

    let status_text: String = row.get("status")?;
    let status = MatchStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid match status `{status_text}` in matches.status"))
    })?;

    Ok(Match {
        id: parse_uuid(&id_text, "matches.id")?,
        client_id: parse_uuid(&client_text, "matches.client_id")?,
        property_id: parse_uuid(&property_text, "matches.property_id")?,
        match_score,
        is_viewed: parse_bool(row.get("is_viewed")?, "matches.is_viewed")?,
        status,
        created_at: row.get("created_at")?,
    })
}
