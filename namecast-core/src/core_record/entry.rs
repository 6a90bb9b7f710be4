/*
    NameEntry - signed, sequence-numbered name payload

    The value of an `/ipns/` record. It binds a path (`/ipfs/...` or another
    `/ipns/...` name) to the author's key until `validity`, with a
    publisher-chosen `sequence` that orders competing versions.
*/

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::core_namesys::errors::{NameStoreError, NameStoreResult};

const SIGNATURE_DOMAIN: &[u8] = b"namecast-entry:";

/// Current Unix timestamp in seconds (0 if the clock is before the epoch)
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameEntry {
    /// Target path
    pub value: String,

    /// Strictly increasing per publisher; the higher sequence wins
    pub sequence: u64,

    /// Expiry as a Unix timestamp in seconds
    pub validity: u64,

    /// Cache hint for resolvers, in seconds
    pub ttl: u64,

    /// Ed25519 signature over `signing_payload()`
    pub signature: Vec<u8>,

    /// Embedded public key; must match the author when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<Vec<u8>>,
}

impl NameEntry {
    /// Bytes covered by the signature
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(SIGNATURE_DOMAIN.len() + self.value.len() + 16);
        payload.extend_from_slice(SIGNATURE_DOMAIN);
        payload.extend_from_slice(self.value.as_bytes());
        payload.extend_from_slice(&self.validity.to_be_bytes());
        payload.extend_from_slice(&self.sequence.to_be_bytes());
        payload
    }

    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.validity
    }

    pub fn marshal(&self) -> NameStoreResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| NameStoreError::InvalidRecord(e.to_string()))
    }

    pub fn unmarshal(data: &[u8]) -> NameStoreResult<Self> {
        serde_json::from_slice(data).map_err(|e| NameStoreError::InvalidRecord(e.to_string()))
    }
}
