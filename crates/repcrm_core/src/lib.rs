//! Core domain logic for RepCRM, a CRM for property "repasse" brokers.
//! This crate is the single source of truth for business invariants.

pub mod cache;
pub mod config;
pub mod currency;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod storage;

pub use cache::{Mutation, QueryCache, QueryKey};
pub use config::{ConfigError, CrmConfig};
pub use currency::Money;
pub use db::{now_epoch_ms, open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::client::{Client, ClientDraft, ClientId, ClientStatus, ClientType};
pub use model::matching::{Match, MatchId, MatchStatus, MatchWithDetails};
pub use model::media::{GalleryCursor, MediaKind, PropertyMedia};
pub use model::property::{Property, PropertyDraft, PropertyId, PropertyStatus, PropertyType};
pub use model::UserId;
pub use repo::client_repo::{ClientRepository, SqliteClientRepository};
pub use repo::match_repo::{MatchRepository, SqliteMatchRepository};
pub use repo::property_repo::{PropertyRepository, SqlitePropertyRepository};
pub use repo::{Entity, RepoError, RepoResult, StatusPredicate};
pub use service::client_service::{ClientFilter, ClientService};
pub use service::dashboard_service::{DashboardService, DashboardStats};
pub use service::match_service::{MatchService, DASHBOARD_RECENT_MATCHES};
pub use service::property_service::{PropertyFilter, PropertyService};
pub use service::{ServiceError, ServiceResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
