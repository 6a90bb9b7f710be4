//! Local datastore
//!
//! Durable byte storage for cached records, keyed by `RecordKey`. The record
//! store borrows a datastore; it never owns its lifecycle.

use async_trait::async_trait;
use std::sync::Arc;

mod errors;
mod memory;
mod sqlite;

pub use errors::{DatastoreError, DatastoreResult};
pub use memory::MemoryDatastore;
pub use sqlite::SqliteDatastore;

use crate::config::{StoreBackend, StoreConfig};
use crate::core_record::RecordKey;

/// Key-value contract consumed by the record store
///
/// Implementations must return `DatastoreError::NotFound` for missing keys
/// and make `put` an atomic replace.
#[async_trait]
pub trait Datastore: Send + Sync {
    async fn get(&self, key: &RecordKey) -> DatastoreResult<Vec<u8>>;

    async fn put(&self, key: &RecordKey, value: Vec<u8>) -> DatastoreResult<()>;

    async fn has(&self, key: &RecordKey) -> DatastoreResult<bool> {
        match self.get(key).await {
            Ok(_) => Ok(true),
            Err(DatastoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn delete(&self, key: &RecordKey) -> DatastoreResult<()>;

    /// All stored keys, in no particular order
    async fn keys(&self) -> DatastoreResult<Vec<RecordKey>>;
}

/// Open the backend selected by the configuration
pub fn open(config: &StoreConfig) -> DatastoreResult<Arc<dyn Datastore>> {
    match config.backend {
        StoreBackend::Memory => Ok(Arc::new(MemoryDatastore::new())),
        StoreBackend::Sqlite => {
            std::fs::create_dir_all(&config.data_dir)?;
            let path = config.data_dir.join("records.sqlite");
            Ok(Arc::new(SqliteDatastore::open(path)?))
        }
    }
}
