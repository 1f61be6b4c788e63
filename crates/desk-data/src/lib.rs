//! Data layer for userdesk.
//!
//! Owns the SQLite user table (schema migrations and the insert/select
//! store) and the outbound client for the remote fact API.

pub mod facts;
pub mod migrations;
pub mod store;

pub use desk_core as core;
