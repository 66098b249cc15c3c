//! Keyed blob storage.
//!
//! The vector index persists its matrix through [`BlobStore`]. Writes are
//! last-writer-wins; there is no coordination between processes.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

pub trait BlobStore: Send + Sync {
    /// Fetch the payload for `key`, `None` on a miss.
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `bytes` under `key`, replacing any previous payload.
    fn save(&self, key: &str, bytes: &[u8]) -> Result<()>;
}

/// Metadata about a stored blob, for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct BlobInfo {
    pub key: String,
    pub size: u64,
    pub updated_at: String,
}

pub struct SqliteBlobStore {
    conn: Mutex<Connection>,
}

impl SqliteBlobStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_connection(super::open_database(path)?))
    }

    pub fn in_memory() -> Result<Self> {
        Ok(Self::from_connection(super::open_memory_database()?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| anyhow::anyhow!("db lock poisoned: {e}"))
    }

    /// List stored blobs without reading their payloads.
    pub fn list(&self) -> Result<Vec<BlobInfo>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT key, size, updated_at FROM blobs ORDER BY key")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(BlobInfo {
                    key: row.get(0)?,
                    size: row.get::<_, i64>(1)? as u64,
                    updated_at: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Remove a blob. Returns whether anything was deleted.
    pub fn remove(&self, key: &str) -> Result<bool> {
        let conn = self.lock()?;
        let n = conn.execute("DELETE FROM blobs WHERE key = ?1", params![key])?;
        Ok(n > 0)
    }
}

impl BlobStore for SqliteBlobStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let conn = self.lock()?;
        let bytes = conn
            .query_row(
                "SELECT bytes FROM blobs WHERE key = ?1",
                params![key],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?;
        Ok(bytes)
    }

    fn save(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let conn = self.lock()?;
        let now = chrono::Utc::now().to_rfc3339();
        conn.execute(
            "INSERT OR REPLACE INTO blobs (key, bytes, size, updated_at) VALUES (?1, ?2, ?3, ?4)",
            params![key, bytes, bytes.len() as i64, now],
        )?;
        tracing::debug!(key, size = bytes.len(), "blob saved");
        Ok(())
    }
}

/// Process-local store, used in tests and when no cache path is configured.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryBlobStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let blobs = self
            .blobs
            .lock()
            .map_err(|e| anyhow::anyhow!("blob map lock poisoned: {e}"))?;
        Ok(blobs.get(key).cloned())
    }

    fn save(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|e| anyhow::anyhow!("blob map lock poisoned: {e}"))?;
        blobs.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_store_round_trips() {
        let store = SqliteBlobStore::in_memory().unwrap();
        assert!(store.load("k").unwrap().is_none());

        store.save("k", &[1, 2, 3]).unwrap();
        assert_eq!(store.load("k").unwrap(), Some(vec![1, 2, 3]));

        // Last writer wins.
        store.save("k", &[9]).unwrap();
        assert_eq!(store.load("k").unwrap(), Some(vec![9]));
    }

    #[test]
    fn sqlite_store_lists_and_removes() {
        let store = SqliteBlobStore::in_memory().unwrap();
        store.save("b", &[0; 16]).unwrap();
        store.save("a", &[0; 4]).unwrap();

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].key, "a");
        assert_eq!(listed[0].size, 4);
        assert_eq!(listed[1].size, 16);

        assert!(store.remove("a").unwrap());
        assert!(!store.remove("a").unwrap());
        assert!(store.load("a").unwrap().is_none());
    }

    #[test]
    fn memory_store_round_trips() {
        let store = MemoryBlobStore::new();
        assert!(store.load("x").unwrap().is_none());
        store.save("x", b"payload").unwrap();
        assert_eq!(store.load("x").unwrap().as_deref(), Some(&b"payload"[..]));
    }
}
