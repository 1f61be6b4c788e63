use std::path::PathBuf;
use thiserror::Error;

use crate::models::WindowId;

/// All errors produced by userdesk.
#[derive(Error, Debug)]
pub enum DeskError {
    /// A SQLite read or write failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// The outbound fact request failed (transport, status or body).
    #[error("Network error: {0}")]
    Network(String),

    /// A channel name is not on the bridge allow-list.
    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    /// A delivery targeted a window that has already been closed.
    #[error("Window {0} is closed")]
    WindowClosed(WindowId),

    /// The database file could not be opened.
    #[error("Failed to open database {path}: {reason}")]
    DatabaseOpen { path: PathBuf, reason: String },

    /// A JSON document could not be parsed or produced.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the desk crates.
pub type Result<T> = std::result::Result<T, DeskError>;
