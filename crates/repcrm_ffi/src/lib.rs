//! Flutter-facing bindings for the RepCRM core.

pub mod api;
