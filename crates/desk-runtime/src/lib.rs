//! Runtime layer for userdesk.
//!
//! Hosts the background process that owns the store and the fact client,
//! the allow-listed message bridge each UI surface talks through, and the
//! registry of live windows.

pub mod background;
pub mod bridge;
pub mod context;
pub mod windows;

pub use desk_core as core;
pub use desk_data as data;
