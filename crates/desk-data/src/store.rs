//! SQLite-backed persistence for user records.
//!
//! [`UserStore`] owns the only connection to the database file. Every call
//! takes the connection lock, which is the store's in-process write
//! serialisation. The store never creates tables on its own; run
//! [`UserStore::migrate`] (or [`crate::migrations::run`]) first.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{params, Connection};

use desk_core::error::{DeskError, Result};
use desk_core::models::User;

use crate::migrations;

/// How long a write waits on a locked database file before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the user table.
#[derive(Debug)]
pub struct UserStore {
    conn: Mutex<Connection>,
    /// `None` for in-memory databases.
    path: Option<PathBuf>,
}

impl UserStore {
    /// Open (or create) the database file at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(|e| DeskError::DatabaseOpen {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        conn.busy_timeout(BUSY_TIMEOUT).map_err(storage)?;

        tracing::debug!(path = %path.display(), "opened user database");

        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(storage)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    /// Path of the backing file, `None` when in memory.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Apply pending schema migrations.
    pub fn migrate(&self) -> Result<usize> {
        let conn = self.lock()?;
        migrations::run(&conn)
    }

    /// Insert one user row. Returns once SQLite has committed the write.
    ///
    /// Nothing is validated: empty strings and duplicates are stored as-is.
    pub fn add_user(&self, name: &str, email: &str, phone: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO Users (name, email, phone) VALUES (?1, ?2, ?3)",
            params![name, email, phone],
        )
        .map_err(storage)?;
        Ok(())
    }

    /// All users in insertion order.
    pub fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT name, email, phone FROM Users ORDER BY rowid")
            .map_err(storage)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(User {
                    name: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                    email: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    phone: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                })
            })
            .map_err(storage)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(storage)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| DeskError::Storage("database mutex poisoned".to_string()))
    }
}

fn storage(e: rusqlite::Error) -> DeskError {
    DeskError::Storage(e.to_string())
}
