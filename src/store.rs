//! # Track Persistence
//!
//! The saved track lives under a single key of a host key-value store as an
//! ordered JSON array of `{latitude, longitude, accuracy}` objects. Array
//! order is acquisition order. Writes are last-writer-wins.

use std::collections::HashMap;

use log::debug;

use crate::error::Result;
use crate::TrackPoint;

/// Key the track is saved under.
pub const PREF_SHAPE: &str = "shape";

/// Opaque string key-value store (shared preferences and the like).
pub trait KeyValueStore {
    fn get_string(&self, key: &str) -> Result<Option<String>>;
    fn put_string(&mut self, key: &str, value: &str) -> Result<()>;
}

/// In-memory store, used by tests and hosts without durable storage.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_string(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn put_string(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Reads and writes the track JSON in a [`KeyValueStore`].
#[derive(Debug)]
pub struct TrackStore<K> {
    store: K,
    key: String,
}

impl<K: KeyValueStore> TrackStore<K> {
    /// Track store using the default [`PREF_SHAPE`] key.
    pub fn new(store: K) -> Self {
        Self::with_key(store, PREF_SHAPE)
    }

    pub fn with_key(store: K, key: &str) -> Self {
        Self {
            store,
            key: key.to_string(),
        }
    }

    /// Overwrite the saved track.
    pub fn save(&mut self, points: &[TrackPoint]) -> Result<()> {
        let json = serde_json::to_string(points)?;
        self.store.put_string(&self.key, &json)?;
        debug!("[TrackStore] Saved {} points under '{}'", points.len(), self.key);
        Ok(())
    }

    /// Read the saved track. `None` when nothing (or an empty string) is stored.
    pub fn load(&self) -> Result<Option<Vec<TrackPoint>>> {
        match self.store.get_string(&self.key)? {
            Some(json) if !json.is_empty() => {
                let points: Vec<TrackPoint> = serde_json::from_str(&json)?;
                debug!("[TrackStore] Loaded {} points from '{}'", points.len(), self.key);
                Ok(Some(points))
            }
            _ => Ok(None),
        }
    }

    pub fn inner(&self) -> &K {
        &self.store
    }

    pub fn inner_mut(&mut self) -> &mut K {
        &mut self.store
    }
}

// ============================================================================
// SQLite Store
// ============================================================================

#[cfg(feature = "persistence")]
pub use sqlite::SqliteStore;

#[cfg(feature = "persistence")]
mod sqlite {
    use rusqlite::{params, Connection, OptionalExtension};

    use super::KeyValueStore;
    use crate::error::Result;

    /// Durable key-value store in a single SQLite table.
    pub struct SqliteStore {
        db: Connection,
    }

    impl SqliteStore {
        /// Open (or create) the database at `db_path`.
        pub fn new(db_path: &str) -> Result<Self> {
            let db = Connection::open(db_path)?;
            Self::init_schema(&db)?;
            Ok(Self { db })
        }

        /// Create an in-memory database (for testing).
        pub fn in_memory() -> Result<Self> {
            Self::new(":memory:")
        }

        fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
            conn.execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS kv (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL,
                    updated_at INTEGER DEFAULT (strftime('%s', 'now'))
                );
            "#,
            )
        }
    }

    impl KeyValueStore for SqliteStore {
        fn get_string(&self, key: &str) -> Result<Option<String>> {
            let value = self
                .db
                .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                    row.get(0)
                })
                .optional()?;
            Ok(value)
        }

        fn put_string(&mut self, key: &str, value: &str) -> Result<()> {
            self.db.execute(
                "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
                params![key, value],
            )?;
            Ok(())
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
