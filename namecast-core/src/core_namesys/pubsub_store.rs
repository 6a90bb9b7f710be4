/*
    PubsubRecordStore - record store relayed over pubsub

    Key-value store whose `put` broadcasts and whose `get` answers from the
    local cache, while a per-topic handler keeps that cache up to date with
    whatever peers publish.

    Workflow:
    - put(key, value)
      - check key and value, publish value on the key's topic
      - nothing is written locally; the publisher persists its own records
    - get(key)
      - subscribe to the key's topic once (spawns the topic handler)
      - read the local datastore
    - topic handler, one message at a time:
      - skip messages sent by this node
      - drop messages not addressed to the topic, oversized or undecodable
      - validate the record against its claimed author
      - compare with the cached record (missing -> accept, unreadable -> drop,
        identical -> drop, otherwise select)
      - persist the raw bytes

    Inputs:
    - pubsub transport, local datastore, local peer id, validator

    Outputs:
    - published payloads
    - datastore writes from the handlers
    - RecordEvent per handled message

    Each topic has exactly one handler task draining its receiver, so the
    read-compare-write sequence never interleaves for one key. Subscribing
    locks only the topic's own slot, so a slow subscribe does not hold up
    gets for other keys.
*/

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, trace, warn};

use super::errors::{NameStoreError, NameStoreResult};
use crate::config::PubsubConfig;
use crate::core_datastore::{Datastore, DatastoreError};
use crate::core_identity::PeerId;
use crate::core_pubsub::{PubsubMessage, PubsubTransport};
use crate::core_record::{IntoRecordKey, Record, RecordKey, Validator};
use crate::metrics;

/// Tunables for a record store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// Largest value `put` accepts and largest payload a handler decodes
    pub max_record_size: usize,

    /// Buffer of the record event channel
    pub channel_capacity: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        StoreOptions {
            max_record_size: 10 * 1024,
            channel_capacity: 256,
        }
    }
}

impl From<&PubsubConfig> for StoreOptions {
    fn from(config: &PubsubConfig) -> Self {
        StoreOptions {
            max_record_size: config.max_record_size,
            channel_capacity: config.channel_capacity,
        }
    }
}

/// Why a received message was not persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Topic list does not include the handler's topic
    WrongTopic,
    /// Payload exceeds `max_record_size`
    Oversized,
    /// Payload is not a record envelope
    Malformed,
    /// Envelope key differs from the topic key
    KeyMismatch,
    /// Validator returned invalid or could not decide
    Invalid,
    /// Byte-identical to the cached record
    Duplicate,
    /// Not newer than the cached record
    NotBetter,
    /// Validator could not compare with the cached record
    SelectFailed,
    /// Cached record could not be read
    LookupFailed,
    /// Datastore write failed
    StoreFailed,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::WrongTopic => "wrong_topic",
            RejectReason::Oversized => "oversized",
            RejectReason::Malformed => "malformed",
            RejectReason::KeyMismatch => "key_mismatch",
            RejectReason::Invalid => "invalid",
            RejectReason::Duplicate => "duplicate",
            RejectReason::NotBetter => "not_better",
            RejectReason::SelectFailed => "select_failed",
            RejectReason::LookupFailed => "lookup_failed",
            RejectReason::StoreFailed => "store_failed",
        }
    }

    fn counter(&self) -> &'static str {
        match self {
            RejectReason::Duplicate | RejectReason::NotBetter => metrics::MESSAGES_STALE,
            RejectReason::StoreFailed => metrics::RECORDS_STORE_FAILED,
            _ => metrics::MESSAGES_REJECTED,
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of handling one message from another peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordEvent {
    Stored { key: RecordKey, author: PeerId },
    Rejected { key: RecordKey, reason: RejectReason },
}

impl RecordEvent {
    pub fn key(&self) -> &RecordKey {
        match self {
            RecordEvent::Stored { key, .. } | RecordEvent::Rejected { key, .. } => key,
        }
    }
}

/// State shared by every topic handler of one store
struct MessageHandler {
    datastore: Arc<dyn Datastore>,
    validator: Arc<dyn Validator>,
    local: PeerId,
    max_record_size: usize,
    events: broadcast::Sender<RecordEvent>,
}

impl MessageHandler {
    async fn run(self: Arc<Self>, key: RecordKey, mut messages: mpsc::Receiver<PubsubMessage>) {
        while let Some(message) = messages.recv().await {
            self.handle(&key, message).await;
        }
        debug!(topic = %key, "Topic handler stopped, transport closed the subscription");
    }

    async fn handle(&self, key: &RecordKey, message: PubsubMessage) {
        if message.from == self.local {
            trace!(topic = %key, "Ignoring message published by this node");
            metrics::increment(metrics::MESSAGES_IGNORED_SELF);
            return;
        }

        metrics::increment(metrics::MESSAGES_RECEIVED);

        let event = match self.process(key, &message).await {
            Ok(author) => {
                debug!(topic = %key, from = %message.from, author = %author, "Stored received record");
                metrics::increment(metrics::RECORDS_STORED);
                RecordEvent::Stored {
                    key: key.clone(),
                    author,
                }
            }
            Err(reason) => {
                debug!(topic = %key, from = %message.from, reason = %reason, "Dropped received record");
                metrics::increment(reason.counter());
                RecordEvent::Rejected {
                    key: key.clone(),
                    reason,
                }
            }
        };

        // No subscribers is fine
        let _ = self.events.send(event);
    }

    async fn process(&self, key: &RecordKey, message: &PubsubMessage) -> Result<PeerId, RejectReason> {
        if !message.topics.iter().any(|topic| topic == key.as_str()) {
            return Err(RejectReason::WrongTopic);
        }

        if message.data.len() > self.max_record_size {
            return Err(RejectReason::Oversized);
        }

        let record = Record::from_bytes(&message.data).map_err(|e| {
            debug!(topic = %key, error = %e, "Undecodable record payload");
            RejectReason::Malformed
        })?;

        if record.key != *key {
            warn!(topic = %key, record_key = %record.key, "Record published under another key");
            return Err(RejectReason::KeyMismatch);
        }

        match self.validator.validate(&record.value, &record.author) {
            Ok(true) => {}
            Ok(false) => return Err(RejectReason::Invalid),
            Err(e) => {
                warn!(topic = %key, author = %record.author, error = %e, "Record validation failed");
                return Err(RejectReason::Invalid);
            }
        }

        self.is_better(key, &message.data, &record).await?;

        if let Err(e) = self.datastore.put(key, message.data.clone()).await {
            error!(topic = %key, error = %e, "Failed to persist received record");
            return Err(RejectReason::StoreFailed);
        }

        Ok(record.author)
    }

    /// `Ok` when `received` should replace the cached record for `key`
    async fn is_better(&self, key: &RecordKey, raw: &[u8], received: &Record) -> Result<(), RejectReason> {
        let cached = match self.datastore.get(key).await {
            Ok(bytes) => bytes,
            Err(DatastoreError::NotFound(_)) => return Ok(()),
            Err(e) => {
                warn!(topic = %key, error = %e, "Cannot read cached record, dropping received one");
                return Err(RejectReason::LookupFailed);
            }
        };

        if cached == raw {
            return Err(RejectReason::Duplicate);
        }

        let current = match Record::from_bytes(&cached) {
            Ok(record) => record,
            Err(e) => {
                warn!(topic = %key, error = %e, "Cached record is undecodable, replacing it");
                return Ok(());
            }
        };

        match self.validator.select(&received.value, &current.value) {
            Ok(true) => Ok(()),
            Ok(false) => Err(RejectReason::NotBetter),
            Err(e) => {
                warn!(topic = %key, error = %e, "Record selection failed");
                Err(RejectReason::SelectFailed)
            }
        }
    }
}

/// Handler task of one topic, empty until a subscribe succeeds
type TopicSlot = Arc<Mutex<Option<JoinHandle<()>>>>;

/// Pubsub-backed record store
pub struct PubsubRecordStore {
    pubsub: Arc<dyn PubsubTransport>,
    handler: Arc<MessageHandler>,
    options: StoreOptions,
    subscriptions: Mutex<HashMap<String, TopicSlot>>,
}

impl PubsubRecordStore {
    pub fn new(
        pubsub: Arc<dyn PubsubTransport>,
        datastore: Arc<dyn Datastore>,
        peer_id: PeerId,
        validator: Arc<dyn Validator>,
    ) -> Self {
        Self::with_options(pubsub, datastore, peer_id, validator, StoreOptions::default())
    }

    pub fn with_options(
        pubsub: Arc<dyn PubsubTransport>,
        datastore: Arc<dyn Datastore>,
        peer_id: PeerId,
        validator: Arc<dyn Validator>,
        options: StoreOptions,
    ) -> Self {
        let (events, _) = broadcast::channel(options.channel_capacity.max(1));

        PubsubRecordStore {
            pubsub,
            handler: Arc::new(MessageHandler {
                datastore,
                validator,
                local: peer_id,
                max_record_size: options.max_record_size,
                events,
            }),
            options,
            subscriptions: Mutex::new(HashMap::new()),
        }
    }

    pub fn peer_id(&self) -> PeerId {
        self.handler.local
    }

    pub fn options(&self) -> StoreOptions {
        self.options
    }

    /// Publish `value` on the topic of `key`.
    ///
    /// The local datastore is not touched. Publish errors are returned as
    /// reported by the transport.
    pub async fn put(&self, key: impl IntoRecordKey, value: Vec<u8>) -> NameStoreResult<()> {
        let key = key.into_record_key()?;

        if value.is_empty() {
            return Err(NameStoreError::InvalidValue(format!("empty value for {}", key)));
        }
        if value.len() > self.options.max_record_size {
            return Err(NameStoreError::InvalidValue(format!(
                "value of {} bytes exceeds limit of {} bytes",
                value.len(),
                self.options.max_record_size
            )));
        }

        let size = value.len();
        self.pubsub.publish(key.as_str(), value).await?;

        metrics::increment(metrics::PUBLISH);
        debug!(topic = %key, size, "Published record");
        Ok(())
    }

    /// Subscribe to the topic of `key` if needed, then return the cached
    /// record.
    ///
    /// Never waits for messages: a key nobody has published yet yields
    /// `NoLocalRecord`, and a later call may succeed.
    pub async fn get(&self, key: impl IntoRecordKey) -> NameStoreResult<Vec<u8>> {
        let key = key.into_record_key()?;

        self.ensure_subscribed(&key).await?;

        match self.handler.datastore.get(&key).await {
            Ok(bytes) => Ok(bytes),
            Err(DatastoreError::NotFound(_)) => Err(NameStoreError::NoLocalRecord(key.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn ensure_subscribed(&self, key: &RecordKey) -> NameStoreResult<()> {
        let topic = key.as_str().to_string();

        let slot = self
            .subscriptions
            .lock()
            .await
            .entry(topic.clone())
            .or_default()
            .clone();

        // Held across subscribe so concurrent gets for this topic register
        // one handler
        let mut task = slot.lock().await;

        if let Some(running) = task.as_ref() {
            if !running.is_finished() {
                return Ok(());
            }
            debug!(topic = %topic, "Previous subscription ended, subscribing again");
        }

        let messages = self
            .pubsub
            .subscribe(&topic)
            .await
            .map_err(|source| NameStoreError::SubscriptionFailed {
                topic: topic.clone(),
                source,
            })?;

        *task = Some(tokio::spawn(self.handler.clone().run(key.clone(), messages)));

        metrics::increment(metrics::SUBSCRIBE);
        debug!(topic = %topic, "Subscribed to record topic");
        Ok(())
    }

    /// Topics with a live handler, sorted. Topics still subscribing are
    /// left out.
    pub async fn subscriptions(&self) -> Vec<String> {
        let slots: Vec<(String, TopicSlot)> = self
            .subscriptions
            .lock()
            .await
            .iter()
            .map(|(topic, slot)| (topic.clone(), slot.clone()))
            .collect();

        let mut topics: Vec<String> = slots
            .into_iter()
            .filter(|(_, slot)| match slot.try_lock() {
                Ok(task) => task.as_ref().is_some_and(|task| !task.is_finished()),
                Err(_) => false,
            })
            .map(|(topic, _)| topic)
            .collect();
        topics.sort();
        topics
    }

    /// Stream of handling outcomes for messages from other peers
    pub fn subscribe_events(&self) -> broadcast::Receiver<RecordEvent> {
        self.handler.events.subscribe()
    }

    pub fn validate_record(&self, value: &[u8], author: &PeerId) -> NameStoreResult<bool> {
        self.handler.validator.validate(value, author)
    }

    pub fn select_record(&self, received: &[u8], current: &[u8]) -> NameStoreResult<bool> {
        self.handler.validator.select(received, current)
    }
}

impl Drop for PubsubRecordStore {
    fn drop(&mut self) {
        for (_, slot) in self.subscriptions.get_mut().drain() {
            if let Ok(mut task) = slot.try_lock() {
                if let Some(task) = task.take() {
                    task.abort();
                }
            }
        }
    }
}
