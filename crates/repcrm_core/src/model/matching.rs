//! Buyer/property match records.
//!
//! Matches are scored and inserted by an external producer. The core stores
//! them, tracks whether the broker has seen them, and moves them into
//! negotiation.
//!
//! # Invariants
//! - `match_score` is within `0..=100`.
//! - At most one match exists per (client, property) pair.

use crate::model::client::{Client, ClientId};
use crate::model::property::{Property, PropertyId};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type MatchId = Uuid;

pub const MAX_MATCH_SCORE: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    #[default]
    Pending,
    Negotiating,
}

impl MatchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Negotiating => "negotiating",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "negotiating" => Some(Self::Negotiating),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pendente",
            Self::Negotiating => "Em Negociação",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchScoreOutOfRange(pub u32);

impl Display for MatchScoreOutOfRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "match_score {} is outside 0..={MAX_MATCH_SCORE}",
            self.0
        )
    }
}

impl Error for MatchScoreOutOfRange {}

/// Validates an externally computed score.
pub fn checked_score(score: u32) -> Result<u8, MatchScoreOutOfRange> {
    u8::try_from(score)
        .ok()
        .filter(|value| *value <= MAX_MATCH_SCORE)
        .ok_or(MatchScoreOutOfRange(score))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub client_id: ClientId,
    pub property_id: PropertyId,
    pub match_score: u8,
    pub is_viewed: bool,
    pub status: MatchStatus,
    pub created_at: i64,
}

impl Match {
    /// Creates a fresh, unviewed, pending match.
    pub fn new(
        client_id: ClientId,
        property_id: PropertyId,
        score: u32,
        now_ms: i64,
    ) -> Result<Self, MatchScoreOutOfRange> {
        Ok(Self {
            id: Uuid::new_v4(),
            client_id,
            property_id,
            match_score: checked_score(score)?,
            is_viewed: false,
            status: MatchStatus::Pending,
            created_at: now_ms,
        })
    }
}

/// Match row joined with the records it points at, for list display.
///
/// The joins are optional because the referenced row may be unreadable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchWithDetails {
    #[serde(flatten)]
    pub record: Match,
    pub client: Option<Client>,
    pub property: Option<Property>,
}
