//! Settings store implementation

use std::sync::Arc;

use rusqlite::{params, OptionalExtension};

use crate::db::Database;
use crate::error::Result;

const LAST_SYNC_AT_KEY: &str = "last_sync_at";

/// Key/value settings access over the shared database
///
/// The sync engine uses this for the persisted last-sync timestamp the UI
/// renders.
#[derive(Clone)]
pub struct SqliteSettingsStore {
    db: Arc<Database>,
}

impl SqliteSettingsStore {
    /// Create a new store over the shared database
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Timestamp of the last completed sync attempt (Unix ms), if any
    pub fn last_sync_at(&self) -> Result<Option<i64>> {
        Ok(self
            .get(LAST_SYNC_AT_KEY)?
            .and_then(|value| value.parse().ok()))
    }

    /// Record the timestamp of a completed sync attempt
    pub fn set_last_sync_at(&self, timestamp_ms: i64) -> Result<()> {
        self.set(LAST_SYNC_AT_KEY, &timestamp_ms.to_string())
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.db.lock();
        let value = conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.db.lock();
        conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)",
            params![key, value],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> SqliteSettingsStore {
        SqliteSettingsStore::new(Arc::new(Database::open_in_memory().unwrap()))
    }

    #[test]
    fn test_last_sync_at_defaults_to_none() {
        let store = setup();
        assert_eq!(store.last_sync_at().unwrap(), None);
    }

    #[test]
    fn test_set_and_read_last_sync_at() {
        let store = setup();
        store.set_last_sync_at(1_700_000_000_000).unwrap();
        assert_eq!(store.last_sync_at().unwrap(), Some(1_700_000_000_000));

        store.set_last_sync_at(1_700_000_001_000).unwrap();
        assert_eq!(store.last_sync_at().unwrap(), Some(1_700_000_001_000));
    }
}
