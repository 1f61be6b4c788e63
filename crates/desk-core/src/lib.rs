//! Shared foundation for userdesk.
//!
//! Holds the error taxonomy, the user and window models, the allow-listed
//! bridge channel contract, and command-line settings.

pub mod channels;
pub mod error;
pub mod models;
pub mod settings;
