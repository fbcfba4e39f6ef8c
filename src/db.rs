//! SQLite connection and schema migration for the project store.
//!
//! The store is an explicitly constructed, owned resource: callers open a
//! connection, pass it (or the [`ProjectStore`](crate::project::ProjectStore)
//! wrapping it) by reference to whatever needs it, and drop it when done.
//! There is no process-wide handle.

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;

/// Schema migrations, applied in order and tracked by `user_version`.
const MIGRATIONS: &[&str] = &[
    // v1: project payloads keyed by id, listable by recency.
    r#"
    CREATE TABLE projects (
        id            TEXT PRIMARY KEY,
        last_modified INTEGER NOT NULL,
        data          TEXT NOT NULL
    );
    CREATE INDEX idx_projects_by_date ON projects(last_modified);
    "#,
];

/// Open (creating if necessary) the store database and bring its schema
/// up to date. Idempotent: re-opening an existing store applies nothing.
pub fn open(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create store directory: {}", parent.display()))?;
        }
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open project store: {}", path.display()))?;
    migrate(&conn)?;
    Ok(conn)
}

/// In-memory store, used by tests.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    migrate(&conn)?;
    Ok(conn)
}

fn migrate(conn: &Connection) -> Result<()> {
    let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    for (i, sql) in MIGRATIONS.iter().enumerate().skip(version as usize) {
        conn.execute_batch(sql)
            .with_context(|| format!("Migration to schema v{} failed", i + 1))?;
        conn.pragma_update(None, "user_version", i as i64 + 1)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migration_creates_projects_table() {
        let conn = open_in_memory().unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type='table' AND name='projects'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn open_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("cv.sqlite");
        {
            let _conn = open(&path).unwrap();
        }
        let conn = open(&path).unwrap();
        let version: i64 = conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, MIGRATIONS.len() as i64);
    }
}
