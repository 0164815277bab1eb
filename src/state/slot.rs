use rusqlite::{Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::StoreError;

/// A named slot holding one string value, like browser local storage
pub trait KeyValueSlot {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Key-value slots kept in a small SQLite database on the device
pub struct SqliteSlot {
    conn: Connection,
    db_path: Option<PathBuf>,
}

impl SqliteSlot {
    /// Open (or create) the database in the user's data directory:
    /// - Linux: ~/.local/share/film-meter/film_meter.db
    /// - macOS: ~/Library/Application Support/film-meter/film_meter.db
    /// - Windows: %APPDATA%\film-meter\film_meter.db
    pub fn open_default() -> Result<Self, StoreError> {
        Self::open(&Self::default_path()?)
    }

    /// Open (or create) the database at `path`
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        let slot = Self {
            conn,
            db_path: Some(path.to_path_buf()),
        };
        slot.init_schema()?;

        info!(path = %path.display(), "shot log database opened");
        Ok(slot)
    }

    /// A throwaway database that lives only as long as this value
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let slot = Self {
            conn: Connection::open_in_memory()?,
            db_path: None,
        };
        slot.init_schema()?;
        Ok(slot)
    }

    /// Where the database lives when no path is configured
    pub fn default_path() -> Result<PathBuf, StoreError> {
        let mut path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .ok_or(StoreError::NoDataDir)?;

        path.push("film-meter");
        path.push("film_meter.db");
        Ok(path)
    }

    /// Path of the database file, `None` for in-memory databases
    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS kv_slots (
                key             TEXT PRIMARY KEY,
                value           TEXT NOT NULL,
                updated_at      INTEGER NOT NULL
            )",
            [],
        )?;
        Ok(())
    }
}

impl KeyValueSlot for SqliteSlot {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_slots WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO kv_slots (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            rusqlite::params![key, value, chrono::Utc::now().timestamp()],
        )?;
        Ok(())
    }
}

impl std::fmt::Debug for SqliteSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteSlot")
            .field("db_path", &self.db_path)
            .finish()
    }
}

/// Slots held in memory only
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    values: HashMap<String, String>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueSlot for MemorySlot {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_slot() {
        let mut slot = MemorySlot::new();
        assert_eq!(slot.get("film-logs").unwrap(), None);

        slot.set("film-logs", "[]").unwrap();
        assert_eq!(slot.get("film-logs").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_sqlite_slot_overwrites() {
        let mut slot = SqliteSlot::open_in_memory().unwrap();
        assert_eq!(slot.get("film-logs").unwrap(), None);

        slot.set("film-logs", "[1]").unwrap();
        slot.set("film-logs", "[2]").unwrap();
        assert_eq!(slot.get("film-logs").unwrap().as_deref(), Some("[2]"));
        assert!(slot.path().is_none());
    }

    #[test]
    fn test_sqlite_slot_persists_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("film_meter.db");

        {
            let mut slot = SqliteSlot::open(&path).unwrap();
            slot.set("film-logs", "[\"kept\"]").unwrap();
        }

        let slot = SqliteSlot::open(&path).unwrap();
        assert_eq!(slot.get("film-logs").unwrap().as_deref(), Some("[\"kept\"]"));
        assert_eq!(slot.path(), Some(path.as_path()));
    }
}
