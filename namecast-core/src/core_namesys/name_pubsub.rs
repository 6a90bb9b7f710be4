//! IPNS pubsub management: whether pubsub naming is on, and which names the
//! node is following.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, warn};

use super::errors::{NameStoreError, NameStoreResult};
use super::pubsub_store::PubsubRecordStore;
use crate::core_identity::PeerId;
use crate::core_record::IPNS_PREFIX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PubsubState {
    pub enabled: bool,
}

pub struct NamePubsub {
    store: Option<Arc<PubsubRecordStore>>,
}

impl NamePubsub {
    /// Pubsub naming backed by `store`
    pub fn enabled(store: Arc<PubsubRecordStore>) -> Self {
        NamePubsub { store: Some(store) }
    }

    pub fn disabled() -> Self {
        NamePubsub { store: None }
    }

    pub fn state(&self) -> PubsubState {
        PubsubState {
            enabled: self.store.is_some(),
        }
    }

    /// Peers whose `/ipns/` names currently have a subscription
    pub async fn subs(&self) -> NameStoreResult<Vec<PeerId>> {
        let store = self.store.as_ref().ok_or_else(|| {
            error!("IPNS pubsub subsystem is not enabled");
            NameStoreError::NotEnabled
        })?;

        let mut peers = Vec::new();
        for topic in store.subscriptions().await {
            let Some(id) = topic.strip_prefix(IPNS_PREFIX) else {
                continue;
            };
            match PeerId::parse(id) {
                Ok(peer) => peers.push(peer),
                Err(e) => warn!(topic = %topic, error = %e, "ipns key is not a valid peer ID"),
            }
        }
        Ok(peers)
    }
}
