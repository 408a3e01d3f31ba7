//! CRM domain model: properties, clients and matches.
//!
//! # Responsibility
//! - Define canonical records shared by repositories, services and FFI.
//! - Keep form validation next to the records it protects.
//!
//! # Invariants
//! - Every record is identified by a stable UUID.
//! - Enum wire names are the lowercase Portuguese identifiers used in storage.

pub mod client;
pub mod matching;
pub mod media;
pub mod property;
pub mod regions;

/// Authenticated owner recorded on properties and clients.
///
/// Authentication happens outside the core; only the resulting id is kept.
pub type UserId = uuid::Uuid;
