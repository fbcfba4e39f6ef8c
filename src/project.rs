//! Project persistence: save, load, list, and delete project payloads.
//!
//! Each project (book settings, chapters, knowledge-base documents) is
//! stored as one JSON payload keyed by project id, with a `last_modified`
//! column for recency ordering. The autosave path in an editor calls
//! [`ProjectStore::save`] from a debounced trigger; the store itself does
//! no debouncing.

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::db;
use crate::models::ProjectData;

/// Summary row returned by [`ProjectStore::list`].
#[derive(Debug, Clone)]
pub struct ProjectSummary {
    pub id: String,
    pub title: String,
    pub last_modified: i64,
}

/// Owned handle to the on-disk project store.
pub struct ProjectStore {
    conn: Connection,
}

impl ProjectStore {
    /// Open the store at `path`, creating it and its schema if needed.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            conn: db::open(path)?,
        })
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: db::open_in_memory()?,
        })
    }

    /// Insert or update a project, bumping its `last_modified` stamp.
    pub fn save(&self, project: &ProjectData) -> Result<()> {
        let mut stamped = project.clone();
        stamped.last_modified = Utc::now().timestamp();
        let data = serde_json::to_string(&stamped).context("Failed to serialize project")?;
        self.conn
            .execute(
                r#"
                INSERT INTO projects (id, last_modified, data) VALUES (?1, ?2, ?3)
                ON CONFLICT(id) DO UPDATE SET
                    last_modified = excluded.last_modified,
                    data = excluded.data
                "#,
                params![stamped.id, stamped.last_modified, data],
            )
            .context("Failed to save project")?;
        Ok(())
    }

    /// Load a project by id, or `None` if it does not exist.
    pub fn load(&self, id: &str) -> Result<Option<ProjectData>> {
        let data: Option<String> = self
            .conn
            .query_row("SELECT data FROM projects WHERE id = ?1", [id], |row| {
                row.get(0)
            })
            .optional()?;
        match data {
            Some(json) => {
                let project =
                    serde_json::from_str(&json).context("Failed to deserialize project")?;
                Ok(Some(project))
            }
            None => Ok(None),
        }
    }

    /// All projects, most recently modified first.
    pub fn list(&self) -> Result<Vec<ProjectSummary>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, last_modified, data FROM projects ORDER BY last_modified DESC")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut summaries = Vec::new();
        for row in rows {
            let (id, last_modified, json) = row?;
            let title = serde_json::from_str::<ProjectData>(&json)
                .map(|p| p.book.title)
                .unwrap_or_else(|_| "(unreadable)".to_string());
            summaries.push(ProjectSummary {
                id,
                title,
                last_modified,
            });
        }
        Ok(summaries)
    }

    /// Delete a project. Returns false if no such project existed.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM projects WHERE id = ?1", [id])?;
        Ok(affected > 0)
    }
}
