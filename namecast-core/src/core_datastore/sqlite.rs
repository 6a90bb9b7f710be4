//! SQLite-backed datastore
//!
//! One `records` table keyed by the record key's string form. rusqlite is
//! blocking, so every call runs on the blocking pool.

use async_trait::async_trait;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::{debug, warn};

use super::{Datastore, DatastoreError, DatastoreResult};
use crate::core_record::RecordKey;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS records (
    key   TEXT PRIMARY KEY NOT NULL,
    value BLOB NOT NULL
)";

pub struct SqliteDatastore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteDatastore {
    /// Open (or create) a database file
    pub fn open(path: impl AsRef<Path>) -> DatastoreResult<Self> {
        let path = path.as_ref();
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::new(manager)?;
        debug!(path = %path.display(), "Opened sqlite datastore");
        Self::with_pool(pool)
    }

    /// Private in-memory database.
    ///
    /// Each sqlite connection to `:memory:` is a separate database, so the
    /// pool is capped at a single connection.
    pub fn memory() -> DatastoreResult<Self> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager)?;
        Self::with_pool(pool)
    }

    fn with_pool(pool: Pool<SqliteConnectionManager>) -> DatastoreResult<Self> {
        pool.get()?.execute_batch(SCHEMA)?;
        Ok(SqliteDatastore { pool })
    }

    async fn run<F, T>(&self, f: F) -> DatastoreResult<T>
    where
        F: FnOnce(&Connection) -> DatastoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            f(&conn)
        })
        .await
        .map_err(|e| DatastoreError::Storage(format!("blocking task failed: {}", e)))?
    }
}

#[async_trait]
impl Datastore for SqliteDatastore {
    async fn get(&self, key: &RecordKey) -> DatastoreResult<Vec<u8>> {
        let key = key.to_string();
        self.run(move |conn| {
            conn.query_row(
                "SELECT value FROM records WHERE key = ?1",
                params![key],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?
            .ok_or(DatastoreError::NotFound(key))
        })
        .await
    }

    async fn put(&self, key: &RecordKey, value: Vec<u8>) -> DatastoreResult<()> {
        let key = key.to_string();
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO records (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )?;
            Ok(())
        })
        .await
    }

    async fn delete(&self, key: &RecordKey) -> DatastoreResult<()> {
        let key = key.to_string();
        self.run(move |conn| {
            let removed = conn.execute("DELETE FROM records WHERE key = ?1", params![key])?;
            if removed == 0 {
                return Err(DatastoreError::NotFound(key));
            }
            Ok(())
        })
        .await
    }

    async fn keys(&self) -> DatastoreResult<Vec<RecordKey>> {
        self.run(|conn| {
            let mut stmt = conn.prepare("SELECT key FROM records")?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

            let mut keys = Vec::new();
            for row in rows {
                let raw = row?;
                match RecordKey::parse(raw.as_str()) {
                    Ok(key) => keys.push(key),
                    Err(e) => warn!(key = %raw, error = %e, "Skipping malformed key in datastore"),
                }
            }
            Ok(keys)
        })
        .await
    }
}
