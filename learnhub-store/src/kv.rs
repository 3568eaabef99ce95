//! Key-value port and its backends.

use crate::error::{StoreError, StoreResult};
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Port over a namespaced string key-value store.
///
/// Values are opaque strings: JSON for structured records, plain text for
/// scalar settings keys. Implementations serialize access internally; the
/// callers never hold a lock across two operations.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;
    fn remove(&self, key: &str) -> StoreResult<()>;
    /// All stored keys, in no particular order.
    fn keys(&self) -> StoreResult<Vec<String>>;
}

/// Embedded SQLite key-value backend: one `kv` table, WAL journal mode.
pub struct SqliteKv {
    conn: Mutex<Connection>,
}

impl SqliteKv {
    /// Opens (or creates) the store at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::init(conn)
    }

    /// Opens an in-memory store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl KeyValueStore for SqliteKv {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let conn = self.conn()?;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT key FROM kv")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }
}

/// In-memory key-value backend for tests and embedders without a
/// filesystem.
#[derive(Debug, Default)]
pub struct MemoryKv {
    map: Mutex<HashMap<String, String>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self) -> StoreResult<MutexGuard<'_, HashMap<String, String>>> {
        self.map.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl KeyValueStore for MemoryKv {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.map()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.map()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.map()?.remove(key);
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        Ok(self.map()?.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(kv: &dyn KeyValueStore) {
        assert_eq!(kv.get("lh_theme").unwrap(), None);
        kv.set("lh_theme", "dark").unwrap();
        kv.set("lh_theme", "light").unwrap();
        assert_eq!(kv.get("lh_theme").unwrap().as_deref(), Some("light"));
        kv.remove("lh_theme").unwrap();
        assert_eq!(kv.get("lh_theme").unwrap(), None);
    }

    #[test]
    fn memory_roundtrip() {
        roundtrip(&MemoryKv::new());
    }

    #[test]
    fn sqlite_roundtrip() {
        roundtrip(&SqliteKv::open_in_memory().unwrap());
    }

    #[test]
    fn sqlite_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("learnhub.db");
        {
            let kv = SqliteKv::open(&path).unwrap();
            kv.set("lh_language", "pt-BR").unwrap();
        }
        let kv = SqliteKv::open(&path).unwrap();
        assert_eq!(kv.get("lh_language").unwrap().as_deref(), Some("pt-BR"));
    }

    #[test]
    fn keys_lists_everything() {
        let kv = MemoryKv::new();
        kv.set("lh_user", "{}").unwrap();
        kv.set("lh_data", "{}").unwrap();
        let mut keys = kv.keys().unwrap();
        keys.sort();
        assert_eq!(keys, vec!["lh_data", "lh_user"]);
    }
}
