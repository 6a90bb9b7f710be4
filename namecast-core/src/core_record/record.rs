/*
    Record - routing envelope carried on the wire

    Every pubsub message payload and every cached datastore value is one
    serialized `Record`. The envelope names its author; the inner `value` is
    opaque here and only interpreted by the validator.
*/

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::key::RecordKey;
use crate::core_identity::PeerId;
use crate::core_namesys::errors::{NameStoreError, NameStoreResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub key: RecordKey,

    /// Validator-specific payload (a marshalled `NameEntry` for `/ipns/` keys)
    pub value: Vec<u8>,

    /// Claimed author; the validator checks the payload against it
    pub author: PeerId,

    /// RFC 3339 time the record was received, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_received: Option<String>,
}

impl Record {
    pub fn new(key: RecordKey, value: Vec<u8>, author: PeerId) -> Self {
        Record {
            key,
            value,
            author,
            time_received: None,
        }
    }

    pub fn with_time_received(mut self, at: DateTime<Utc>) -> Self {
        self.time_received = Some(at.to_rfc3339());
        self
    }

    pub fn to_bytes(&self) -> NameStoreResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| NameStoreError::InvalidRecord(e.to_string()))
    }

    pub fn from_bytes(data: &[u8]) -> NameStoreResult<Self> {
        serde_json::from_slice(data).map_err(|e| NameStoreError::InvalidRecord(e.to_string()))
    }
}
