//! Plain data types shared by every layer.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── User ──────────────────────────────────────────────────────────────────────

/// A single user record as stored and as shown in the main list.
///
/// No field is validated: empty strings and duplicates are legal. The storage
/// row id is deliberately not part of this type. Missing fields decode as
/// empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl User {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
        }
    }
}

// ── Windows ───────────────────────────────────────────────────────────────────

/// Identity of one UI surface instance. Never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WindowId(u64);

impl WindowId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The three kinds of UI surface the shell can open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowKind {
    /// Main user list. Closing it quits the application.
    Main,
    /// Create-user form.
    AddUser,
    /// Viewer for the fetched fact.
    ApiViewer,
}

impl WindowKind {
    /// Title shown in the window border.
    pub fn title(self) -> &'static str {
        match self {
            Self::Main => "Users",
            Self::AddUser => "Create User",
            Self::ApiViewer => "Data from API",
        }
    }
}

impl fmt::Display for WindowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Main => "main",
            Self::AddUser => "add-user",
            Self::ApiViewer => "api-viewer",
        };
        f.write_str(name)
    }
}
