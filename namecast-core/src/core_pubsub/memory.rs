//! MemoryPubsub: in-process flood pubsub
//!
//! A shared `MemoryNetwork` holds one broadcast channel per topic. Every
//! `MemoryPubsub` attached to the network publishes into those channels and
//! forwards what it receives to its subscribers. Like floodsub, a node
//! receives its own publications on topics it has joined.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{PubsubError, PubsubMessage, PubsubResult, PubsubTransport};
use crate::core_identity::PeerId;

const TOPIC_CAPACITY: usize = 256;

/// Shared broker connecting `MemoryPubsub` instances
#[derive(Clone, Debug, Default)]
pub struct MemoryNetwork {
    topics: Arc<RwLock<HashMap<String, broadcast::Sender<PubsubMessage>>>>,
}

impl MemoryNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    async fn get_or_create(&self, topic: &str) -> broadcast::Sender<PubsubMessage> {
        let mut topics = self.topics.write().await;
        topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(TOPIC_CAPACITY).0)
            .clone()
    }

    async fn get(&self, topic: &str) -> Option<broadcast::Sender<PubsubMessage>> {
        self.topics.read().await.get(topic).cloned()
    }
}

/// One node's view of a `MemoryNetwork`
pub struct MemoryPubsub {
    local: PeerId,
    network: MemoryNetwork,
    delivery_capacity: usize,
    forwarders: Mutex<HashMap<String, Vec<JoinHandle<()>>>>,
}

impl MemoryPubsub {
    pub fn new(local: PeerId, network: &MemoryNetwork) -> Self {
        MemoryPubsub {
            local,
            network: network.clone(),
            delivery_capacity: TOPIC_CAPACITY,
            forwarders: Mutex::new(HashMap::new()),
        }
    }

    /// Buffer size of each subscriber's delivery channel
    pub fn with_delivery_capacity(mut self, capacity: usize) -> Self {
        self.delivery_capacity = capacity.max(1);
        self
    }

    pub fn local_peer(&self) -> PeerId {
        self.local
    }
}

#[async_trait]
impl PubsubTransport for MemoryPubsub {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> PubsubResult<()> {
        let message = PubsubMessage {
            data: payload,
            from: self.local,
            topics: vec![topic.to_string()],
        };

        // Publishing to a topic nobody joined is not an error.
        if let Some(sender) = self.network.get(topic).await {
            let receivers = sender.send(message).unwrap_or(0);
            debug!(topic, receivers, "Published message");
        }
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> PubsubResult<mpsc::Receiver<PubsubMessage>> {
        let mut inbound = self.network.get_or_create(topic).await.subscribe();
        let (tx, rx) = mpsc::channel(self.delivery_capacity);
        let topic_name = topic.to_string();

        // Exits once the subscriber drops its receiver or the topic closes
        let forwarder = tokio::spawn(async move {
            loop {
                let received = tokio::select! {
                    received = inbound.recv() => received,
                    _ = tx.closed() => break,
                };
                match received {
                    Ok(message) => {
                        if tx.send(message).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(topic = %topic_name, lagged = n, "Pubsub subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        self.forwarders
            .lock()
            .map_err(|_| PubsubError::Subscribe("subscription table poisoned".to_string()))?
            .entry(topic.to_string())
            .or_default()
            .push(forwarder);

        debug!(topic, peer = %self.local, "Subscribed");
        Ok(rx)
    }

    /// Topics with at least one live forwarder
    async fn topics(&self) -> Vec<String> {
        match self.forwarders.lock() {
            Ok(forwarders) => forwarders
                .iter()
                .filter(|(_, handles)| handles.iter().any(|handle| !handle.is_finished()))
                .map(|(topic, _)| topic.clone())
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

impl Drop for MemoryPubsub {
    fn drop(&mut self) {
        if let Ok(mut forwarders) = self.forwarders.lock() {
            for (_, handles) in forwarders.drain() {
                for handle in handles {
                    handle.abort();
                }
            }
        }
    }
}
