/*
    PeerId - textual node identity

    A peer id is the base58 encoding of the node's 32-byte Ed25519 public key.
    Since the key is embedded, the verifying key of a record author can be
    recovered from the author's peer id alone, without a lookup.
*/

use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::error::{IdentityError, IdentityResult};

const PUBLIC_KEY_LEN: usize = 32;

/// Node identity derived from an Ed25519 public key
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId([u8; PUBLIC_KEY_LEN]);

impl PeerId {
    /// Build a peer id from raw public key bytes
    pub fn from_public_key_bytes(bytes: &[u8]) -> IdentityResult<Self> {
        let key: [u8; PUBLIC_KEY_LEN] =
            bytes.try_into().map_err(|_| IdentityError::InvalidKeyLength {
                expected: PUBLIC_KEY_LEN,
                actual: bytes.len(),
            })?;
        Ok(PeerId(key))
    }

    pub fn from_verifying_key(key: &VerifyingKey) -> Self {
        PeerId(key.to_bytes())
    }

    /// Parse the base58 form
    pub fn parse(s: &str) -> IdentityResult<Self> {
        let invalid = |reason: String| IdentityError::InvalidPeerId {
            id: s.to_string(),
            reason,
        };

        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| invalid(e.to_string()))?;

        if bytes.len() != PUBLIC_KEY_LEN {
            return Err(invalid(format!(
                "decoded to {} bytes, expected {}",
                bytes.len(),
                PUBLIC_KEY_LEN
            )));
        }

        let mut key = [0u8; PUBLIC_KEY_LEN];
        key.copy_from_slice(&bytes);
        Ok(PeerId(key))
    }

    pub fn to_b58(&self) -> String {
        bs58::encode(self.0).into_string()
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.0
    }

    /// Extract the Ed25519 verifying key embedded in this id.
    ///
    /// Fails when the bytes are not a valid curve point.
    pub fn public_key(&self) -> IdentityResult<VerifyingKey> {
        VerifyingKey::from_bytes(&self.0).map_err(|e| IdentityError::InvalidPeerId {
            id: self.to_b58(),
            reason: e.to_string(),
        })
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_b58())
    }
}

impl fmt::Debug for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeerId({})", self.to_b58())
    }
}

impl FromStr for PeerId {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PeerId::parse(s)
    }
}

impl Serialize for PeerId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_b58())
    }
}

impl<'de> Deserialize<'de> for PeerId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        PeerId::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_identity::Keypair;

    #[test]
    fn test_peer_id_text_round_trip() {
        let kp = Keypair::generate();
        let id = kp.peer_id();

        let parsed = PeerId::parse(&id.to_b58()).unwrap();
        assert_eq!(parsed, id);
        assert_eq!(id.to_string(), id.to_b58());
    }

    #[test]
    fn test_peer_id_rejects_bad_base58() {
        // '0' and 'l' are not in the bitcoin alphabet
        let err = PeerId::parse("0l0l").unwrap_err();
        assert!(matches!(err, IdentityError::InvalidPeerId { .. }));
    }

    #[test]
    fn test_peer_id_rejects_wrong_length() {
        let short = bs58::encode([7u8; 16]).into_string();
        let err = PeerId::parse(&short).unwrap_err();
        assert!(err.to_string().contains("16 bytes"));
    }

    #[test]
    fn test_public_key_extraction() {
        let kp = Keypair::generate();
        let key = kp.peer_id().public_key().unwrap();
        assert_eq!(key.to_bytes(), *kp.peer_id().as_bytes());
    }

    #[test]
    fn test_peer_id_serde_as_string() {
        let id = Keypair::generate().peer_id();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.to_b58()));

        let back: PeerId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
