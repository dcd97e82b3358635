//! SQLite storage implementation
//!
//! The working database always lives in memory. On open, an existing image is
//! restored into it; after every write the whole database is backed up to a
//! sibling temporary file which is then renamed over the image.

use std::path::{Path, PathBuf};
use rusqlite::{Connection, DatabaseName, Transaction};
use serde::Serialize;
use tracing::{debug, info, warn};
use crate::{Error, Result};
use super::schema;

/// In-memory SQLite database backed by an optional on-disk image
pub struct Database {
    conn: Connection,
    image_path: Option<PathBuf>,
}

impl Database {
    /// Load the image at `path` into memory, or start empty if there is none.
    ///
    /// A present but unreadable image is an error; the caller must not serve
    /// from a database that failed to load.
    pub fn load(path: &Path) -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;

        if path.exists() {
            conn.restore(DatabaseName::Main, path, None::<fn(rusqlite::backup::Progress)>)
                .map_err(|e| corrupt(path, e.to_string()))?;

            let status: String = conn
                .query_row("PRAGMA quick_check", [], |row| row.get(0))
                .map_err(|e| corrupt(path, e.to_string()))?;
            if status != "ok" {
                return Err(corrupt(path, status));
            }
            info!(path = %path.display(), "loaded database image");
        } else {
            info!(path = %path.display(), "no database image found, starting empty");
        }

        let db = Self {
            conn,
            image_path: Some(path.to_path_buf()),
        };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Open an in-memory database with no image (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn, image_path: None };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<()> {
        for stmt in schema::all_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        Ok(())
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Start a transaction on the shared connection
    pub(crate) fn transaction(&self) -> Result<Transaction<'_>> {
        Ok(self.conn.unchecked_transaction()?)
    }

    /// Apply a change in one transaction, then flush it to the image.
    ///
    /// A failing `apply` is rolled back. A failing flush runs `undo` against the
    /// committed value, so memory never holds a change the image is missing.
    pub(crate) fn write<T>(
        &self,
        apply: impl FnOnce(&Connection) -> Result<T>,
        undo: impl FnOnce(&Connection, &T) -> Result<()>,
    ) -> Result<T> {
        let tx = self.transaction()?;
        let value = match apply(&*tx) {
            Ok(value) => value,
            Err(err) => {
                tx.rollback()?;
                return Err(err);
            }
        };
        tx.commit()?;

        if let Err(err) = self.flush() {
            warn!(error = %err, "flush failed, reverting in-memory change");
            let tx = self.transaction()?;
            undo(&*tx, &value)?;
            tx.commit()?;
            return Err(err);
        }
        Ok(value)
    }

    /// Write the full database over the image.
    ///
    /// The previous image is only replaced once the new one is completely
    /// written, so a failed flush leaves it untouched.
    pub fn flush(&self) -> Result<()> {
        let Some(path) = self.image_path.as_deref() else {
            return Ok(());
        };

        let tmp = temp_path(path);
        if tmp.exists() {
            std::fs::remove_file(&tmp)?;
        }
        self.conn.backup(DatabaseName::Main, &tmp, None)?;
        std::fs::rename(&tmp, path)?;

        debug!(path = %path.display(), "flushed database image");
        Ok(())
    }

    /// Flush and release the database
    pub fn close(self) -> Result<()> {
        self.flush()?;
        self.conn.close().map_err(|(_, e)| Error::from(e))
    }

    /// Count rows in a table
    fn count(&self, table: &str) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", table);
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        Ok(DbStats {
            people: self.count("people")?,
            roles: self.count("roles")?,
            assignments: self.count("user_roles")?,
        })
    }
}

fn corrupt(path: &Path, reason: String) -> Error {
    Error::CorruptImage {
        path: path.display().to_string(),
        reason,
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Database statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DbStats {
    pub people: usize,
    pub roles: usize,
    pub assignments: usize,
}

impl std::fmt::Display for DbStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        writeln!(f, "  People: {}", self.people)?;
        writeln!(f, "  Roles: {}", self.roles)?;
        writeln!(f, "  Assignments: {}", self.assignments)
    }
}
