/*
    MemoryDatastore - in-process datastore

    Used for tests and for nodes that do not need the cache to survive a
    restart.
*/

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{Datastore, DatastoreError, DatastoreResult};
use crate::core_record::RecordKey;

#[derive(Clone, Default)]
pub struct MemoryDatastore {
    entries: Arc<RwLock<HashMap<RecordKey, Vec<u8>>>>,
}

impl MemoryDatastore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl Datastore for MemoryDatastore {
    async fn get(&self, key: &RecordKey) -> DatastoreResult<Vec<u8>> {
        self.entries
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| DatastoreError::NotFound(key.to_string()))
    }

    async fn put(&self, key: &RecordKey, value: Vec<u8>) -> DatastoreResult<()> {
        self.entries.write().await.insert(key.clone(), value);
        Ok(())
    }

    async fn delete(&self, key: &RecordKey) -> DatastoreResult<()> {
        self.entries
            .write()
            .await
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| DatastoreError::NotFound(key.to_string()))
    }

    async fn keys(&self) -> DatastoreResult<Vec<RecordKey>> {
        Ok(self.entries.read().await.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(path: &str) -> RecordKey {
        RecordKey::parse(path).unwrap()
    }

    #[tokio::test]
    async fn test_put_get_replace() {
        let store = MemoryDatastore::new();
        let k = key("/namerecord/abc");

        store.put(&k, b"one".to_vec()).await.unwrap();
        store.put(&k, b"two".to_vec()).await.unwrap();

        assert_eq!(store.get(&k).await.unwrap(), b"two");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_missing_key_is_not_found() {
        let store = MemoryDatastore::new();
        let err = store.get(&key("/missing")).await.unwrap_err();
        assert!(matches!(err, DatastoreError::NotFound(_)));
        assert!(!store.has(&key("/missing")).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_and_keys() {
        let store = MemoryDatastore::new();
        store.put(&key("/a"), vec![1]).await.unwrap();
        store.put(&key("/b"), vec![2]).await.unwrap();

        store.delete(&key("/a")).await.unwrap();
        assert!(store.delete(&key("/a")).await.is_err());

        assert_eq!(store.keys().await.unwrap(), vec![key("/b")]);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = MemoryDatastore::new();
        let clone = store.clone();
        clone.put(&key("/shared"), vec![7]).await.unwrap();
        assert!(store.has(&key("/shared")).await.unwrap());
    }
}
