//! Schema setup for the user database.
//!
//! Migrations are applied in order and tracked with SQLite's `user_version`
//! pragma, so each one runs at most once per database file. There is only the
//! initial table creation today.

use rusqlite::Connection;

use desk_core::error::{DeskError, Result};

/// Ordered migration scripts; index + 1 is the resulting `user_version`.
const MIGRATIONS: &[&str] = &["CREATE TABLE IF NOT EXISTS Users (
        name  TEXT,
        email TEXT,
        phone TEXT
    );"];

/// Schema version after every migration has run.
pub const LATEST_VERSION: i64 = MIGRATIONS.len() as i64;

/// Apply every pending migration to `conn`.
///
/// Returns the number of migrations that were applied.
pub fn run(conn: &Connection) -> Result<usize> {
    let current = schema_version(conn)?;
    let mut applied = 0;

    for (index, script) in MIGRATIONS.iter().enumerate() {
        let version = index as i64 + 1;
        if version <= current {
            continue;
        }
        conn.execute_batch(script).map_err(storage)?;
        conn.pragma_update(None, "user_version", version)
            .map_err(storage)?;
        tracing::info!(version, "applied database migration");
        applied += 1;
    }

    Ok(applied)
}

/// Current `user_version` of the database.
pub fn schema_version(conn: &Connection) -> Result<i64> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(storage)
}

fn storage(e: rusqlite::Error) -> DeskError {
    DeskError::Storage(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_database_is_version_zero() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(schema_version(&conn).unwrap(), 0);
    }

    #[test]
    fn test_run_creates_users_table() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(run(&conn).unwrap(), 1);
        assert_eq!(schema_version(&conn).unwrap(), LATEST_VERSION);

        let columns: Vec<String> = conn
            .prepare("SELECT name FROM pragma_table_info('Users')")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap();
        assert_eq!(columns, vec!["name", "email", "phone"]);
    }

    #[test]
    fn test_run_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        assert_eq!(run(&conn).unwrap(), 0);
        assert_eq!(schema_version(&conn).unwrap(), LATEST_VERSION);
    }

    #[test]
    fn test_run_keeps_existing_rows() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("database.sqlite");

        {
            let conn = Connection::open(&path).unwrap();
            run(&conn).unwrap();
            conn.execute(
                "INSERT INTO Users (name, email, phone) VALUES ('a', 'b', 'c')",
                [],
            )
            .unwrap();
        }

        let conn = Connection::open(&path).unwrap();
        run(&conn).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM Users", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
