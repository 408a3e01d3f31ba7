//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into screen-level use cases.
//! - Keep UI/FFI layers decoupled from storage details.
//! - Map repository failures into one service error family.

use crate::model::client::ClientValidationError;
use crate::model::matching::MatchScoreOutOfRange;
use crate::model::property::PropertyValidationError;
use crate::repo::{Entity, RepoError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod client_service;
pub mod dashboard_service;
pub mod match_service;
pub mod property_service;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error shared by CRM use cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Write attempted without a signed-in owner.
    MissingOwner,
    InvalidProperty(PropertyValidationError),
    InvalidClient(ClientValidationError),
    InvalidScore(MatchScoreOutOfRange),
    NotFound(Entity, Uuid),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingOwner => write!(f, "user not authenticated"),
            Self::InvalidProperty(err) => write!(f, "{err}"),
            Self::InvalidClient(err) => write!(f, "{err}"),
            Self::InvalidScore(err) => write!(f, "{err}"),
            Self::NotFound(entity, id) => write!(f, "{} not found: {id}", entity.as_str()),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent state: {details}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidProperty(err) => Some(err),
            Self::InvalidClient(err) => Some(err),
            Self::InvalidScore(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl ServiceError {
    /// Short machine-readable code for logs and FFI envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingOwner => "missing_owner",
            Self::InvalidProperty(_) | Self::InvalidClient(_) | Self::InvalidScore(_) => {
                "validation"
            }
            Self::NotFound(..) => "not_found",
            Self::Repo(_) => "storage",
            Self::InconsistentState(_) => "inconsistent_state",
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(entity, id) => Self::NotFound(entity, id),
            RepoError::InvalidProperty(err) => Self::InvalidProperty(err),
            RepoError::InvalidClient(err) => Self::InvalidClient(err),
            RepoError::InvalidScore(err) => Self::InvalidScore(err),
            other => Self::Repo(other),
        }
    }
}

impl From<PropertyValidationError> for ServiceError {
    fn from(value: PropertyValidationError) -> Self {
        Self::InvalidProperty(value)
    }
}

impl From<ClientValidationError> for ServiceError {
    fn from(value: ClientValidationError) -> Self {
        Self::InvalidClient(value)
    }
}

impl From<MatchScoreOutOfRange> for ServiceError {
    fn from(value: MatchScoreOutOfRange) -> Self {
        Self::InvalidScore(value)
    }
}

/// Lowercases both sides for accent-preserving, case-insensitive search.
pub(crate) fn contains_ignore_case(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

/// Trimmed, lowercased search term; `None` when the box is empty.
pub(crate) fn normalize_search(search: &str) -> Option<String> {
    let trimmed = search.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}
