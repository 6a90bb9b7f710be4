/*
    RecordKey - identifier of a name record

    A key is a `/`-separated path such as `/ipns/<peer-id>`. The same key is
    used three ways:
    - as the datastore key (its UTF-8 bytes)
    - as the pubsub topic (its string form)
    - inside the record envelope

    Both encodings carry exactly the same text, so each is derivable from the
    other without loss.
*/

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core_identity::PeerId;
use crate::core_namesys::errors::{NameStoreError, NameStoreResult};

/// Namespace prefix for names owned by a peer
pub const IPNS_PREFIX: &str = "/ipns/";

/// Well-formed record key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordKey(String);

impl RecordKey {
    /// Validate and wrap a path.
    ///
    /// Rules: starts with `/`, has at least one segment, no empty segments
    /// (so no `//` and no trailing `/`), no NUL characters.
    pub fn parse(path: impl Into<String>) -> NameStoreResult<Self> {
        let path = path.into();
        let invalid = |reason: &str| NameStoreError::InvalidKey(format!("{:?}: {}", path, reason));

        if !path.starts_with('/') {
            return Err(invalid("must start with '/'"));
        }
        if path.len() == 1 {
            return Err(invalid("must contain at least one segment"));
        }
        if path.contains('\0') {
            return Err(invalid("must not contain NUL"));
        }
        if path[1..].split('/').any(str::is_empty) {
            return Err(invalid("must not contain empty segments"));
        }

        Ok(RecordKey(path))
    }

    /// Decode the datastore representation
    pub fn from_bytes(bytes: &[u8]) -> NameStoreResult<Self> {
        let path = std::str::from_utf8(bytes)
            .map_err(|e| NameStoreError::InvalidKey(format!("not UTF-8: {}", e)))?;
        Self::parse(path)
    }

    /// `/ipns/<peer-id>`
    pub fn for_peer(peer_id: &PeerId) -> Self {
        RecordKey(format!("{}{}", IPNS_PREFIX, peer_id.to_b58()))
    }

    /// Peer id of an `/ipns/` key; `None` for any other key
    pub fn peer_id(&self) -> Option<PeerId> {
        self.0
            .strip_prefix(IPNS_PREFIX)
            .and_then(|rest| PeerId::parse(rest).ok())
    }

    /// Topic name
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Datastore representation
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RecordKey {
    type Error = NameStoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        RecordKey::parse(value)
    }
}

impl From<RecordKey> for String {
    fn from(key: RecordKey) -> Self {
        key.0
    }
}

/// Conversion used by the record store entry points, so that malformed keys
/// are reported by `put`/`get` themselves as `InvalidKey`.
pub trait IntoRecordKey {
    fn into_record_key(self) -> NameStoreResult<RecordKey>;
}

impl IntoRecordKey for RecordKey {
    fn into_record_key(self) -> NameStoreResult<RecordKey> {
        Ok(self)
    }
}

impl IntoRecordKey for &RecordKey {
    fn into_record_key(self) -> NameStoreResult<RecordKey> {
        Ok(self.clone())
    }
}

impl IntoRecordKey for &str {
    fn into_record_key(self) -> NameStoreResult<RecordKey> {
        RecordKey::parse(self)
    }
}

impl IntoRecordKey for String {
    fn into_record_key(self) -> NameStoreResult<RecordKey> {
        RecordKey::parse(self)
    }
}

impl IntoRecordKey for &[u8] {
    fn into_record_key(self) -> NameStoreResult<RecordKey> {
        RecordKey::from_bytes(self)
    }
}
