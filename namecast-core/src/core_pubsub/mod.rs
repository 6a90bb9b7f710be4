//! Pubsub transport abstraction
//!
//! The record store only needs topic-based publish and subscribe. Production
//! nodes plug in their gossip layer; `MemoryPubsub` connects nodes inside one
//! process for tests and local tooling.

use async_trait::async_trait;
use tokio::sync::mpsc;

mod errors;
mod memory;

pub use errors::{PubsubError, PubsubResult};
pub use memory::{MemoryNetwork, MemoryPubsub};

use crate::core_identity::PeerId;

/// One delivered pubsub message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PubsubMessage {
    /// Raw payload, exactly as published
    pub data: Vec<u8>,
    /// Peer that published the message
    pub from: PeerId,
    /// Topics the message was published on
    pub topics: Vec<String>,
}

#[async_trait]
pub trait PubsubTransport: Send + Sync {
    /// Publish `payload` on `topic`. Success means the transport accepted
    /// the message, not that any peer received it.
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> PubsubResult<()>;

    /// Join `topic`. Messages arrive on the returned receiver in delivery
    /// order, including messages published by this node.
    async fn subscribe(&self, topic: &str) -> PubsubResult<mpsc::Receiver<PubsubMessage>>;

    /// Topics this transport is currently subscribed to
    async fn topics(&self) -> Vec<String>;
}
