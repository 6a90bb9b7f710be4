//! Stub collaborators for the record store
//!
//! - `StubTransport`: captures publishes and subscriptions, delivers
//!   hand-made messages
//! - `SpyDatastore`: memory datastore that counts writes and can fail reads
//!   or writes
//! - `AcceptAll` / `RejectAll`: validators with fixed verdicts

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;

use crate::core_datastore::{Datastore, DatastoreError, DatastoreResult, MemoryDatastore};
use crate::core_identity::PeerId;
use crate::core_namesys::NameStoreResult;
use crate::core_pubsub::{PubsubError, PubsubMessage, PubsubResult, PubsubTransport};
use crate::core_record::{RecordKey, Validator};

/// Transport that records calls instead of talking to a network
#[derive(Default)]
pub struct StubTransport {
    published: Mutex<Vec<(String, Vec<u8>)>>,
    subscribers: Mutex<Vec<(String, mpsc::Sender<PubsubMessage>)>>,
    fail_subscribe: AtomicBool,
    fail_publish: AtomicBool,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_subscribe(&self, fail: bool) {
        self.fail_subscribe.store(fail, Ordering::SeqCst);
    }

    pub fn fail_publish(&self, fail: bool) {
        self.fail_publish.store(fail, Ordering::SeqCst);
    }

    /// `(topic, payload)` pairs in publish order
    pub fn published(&self) -> Vec<(String, Vec<u8>)> {
        self.published.lock().unwrap().clone()
    }

    /// One entry per successful subscribe call
    pub fn subscribed(&self) -> Vec<String> {
        self.subscribers
            .lock()
            .unwrap()
            .iter()
            .map(|(topic, _)| topic.clone())
            .collect()
    }

    /// Deliver `data` from `from` on `topic`; returns how many subscribers
    /// received it
    pub async fn deliver(&self, topic: &str, data: Vec<u8>, from: PeerId) -> usize {
        self.deliver_message(
            topic,
            PubsubMessage {
                data,
                from,
                topics: vec![topic.to_string()],
            },
        )
        .await
    }

    /// Deliver a fully specified message to the subscribers of `topic`
    pub async fn deliver_message(&self, topic: &str, message: PubsubMessage) -> usize {
        let senders: Vec<_> = self
            .subscribers
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, tx)| tx.clone())
            .collect();

        let mut delivered = 0;
        for tx in senders {
            if tx.send(message.clone()).await.is_ok() {
                delivered += 1;
            }
        }
        delivered
    }
}

#[async_trait]
impl PubsubTransport for StubTransport {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> PubsubResult<()> {
        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(PubsubError::Publish("stub refused".to_string()));
        }
        self.published
            .lock()
            .unwrap()
            .push((topic.to_string(), payload));
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> PubsubResult<mpsc::Receiver<PubsubMessage>> {
        if self.fail_subscribe.load(Ordering::SeqCst) {
            return Err(PubsubError::Subscribe("stub refused".to_string()));
        }
        let (tx, rx) = mpsc::channel(64);
        self.subscribers
            .lock()
            .unwrap()
            .push((topic.to_string(), tx));
        Ok(rx)
    }

    async fn topics(&self) -> Vec<String> {
        let mut topics = self.subscribed();
        topics.dedup();
        topics
    }
}

/// Memory datastore that counts successful writes
#[derive(Default)]
pub struct SpyDatastore {
    inner: MemoryDatastore,
    puts: AtomicUsize,
    fail_puts: AtomicBool,
    fail_gets: AtomicBool,
}

impl SpyDatastore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    /// Make reads fail the way an exhausted connection pool does
    pub fn fail_gets(&self, fail: bool) {
        self.fail_gets.store(fail, Ordering::SeqCst);
    }

    /// Write without counting, as an external seeder would
    pub async fn seed(&self, key: &RecordKey, value: Vec<u8>) {
        self.inner.put(key, value).await.unwrap();
    }
}

#[async_trait]
impl Datastore for SpyDatastore {
    async fn get(&self, key: &RecordKey) -> DatastoreResult<Vec<u8>> {
        if self.fail_gets.load(Ordering::SeqCst) {
            return Err(DatastoreError::Pool("timed out waiting for connection".to_string()));
        }
        self.inner.get(key).await
    }

    async fn put(&self, key: &RecordKey, value: Vec<u8>) -> DatastoreResult<()> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(DatastoreError::Storage("spy refused write".to_string()));
        }
        self.inner.put(key, value).await?;
        self.puts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, key: &RecordKey) -> DatastoreResult<()> {
        self.inner.delete(key).await
    }

    async fn keys(&self) -> DatastoreResult<Vec<RecordKey>> {
        self.inner.keys().await
    }
}

/// Every record is valid and newer than the cached one
pub struct AcceptAll;

impl Validator for AcceptAll {
    fn validate(&self, _value: &[u8], _author: &PeerId) -> NameStoreResult<bool> {
        Ok(true)
    }

    fn select(&self, _received: &[u8], _current: &[u8]) -> NameStoreResult<bool> {
        Ok(true)
    }
}

/// Every record is invalid
pub struct RejectAll;

impl Validator for RejectAll {
    fn validate(&self, _value: &[u8], _author: &PeerId) -> NameStoreResult<bool> {
        Ok(false)
    }

    fn select(&self, _received: &[u8], _current: &[u8]) -> NameStoreResult<bool> {
        Ok(false)
    }
}
