/*
    validator.rs - record validation capability

    The record store is generic over a `Validator`, supplied at construction:
    - `validate(value, author)` decides whether a payload is authentic
    - `select(received, current)` decides whether a received payload should
      replace the cached one

    Both methods have default bodies that report the capability as missing.
    A validator that only implements one of them compiles, and the gap is
    surfaced as `NoValidateFunction` / `NoSelectFunction` when the store
    actually needs it.
*/

use tracing::debug;

use super::entry::{current_timestamp, NameEntry};
use crate::core_identity::{Keypair, PeerId};
use crate::core_namesys::errors::{NameStoreError, NameStoreResult};

pub trait Validator: Send + Sync {
    /// `Ok(true)` when `value` is a valid payload authored by `author`
    fn validate(&self, _value: &[u8], _author: &PeerId) -> NameStoreResult<bool> {
        Err(NameStoreError::NoValidateFunction)
    }

    /// `Ok(true)` when `received` is strictly better than `current`
    fn select(&self, _received: &[u8], _current: &[u8]) -> NameStoreResult<bool> {
        Err(NameStoreError::NoSelectFunction)
    }
}

/// Validator for signed `NameEntry` payloads
#[derive(Debug, Clone)]
pub struct NameEntryValidator {
    clock: fn() -> u64,
}

impl NameEntryValidator {
    pub fn new() -> Self {
        NameEntryValidator {
            clock: current_timestamp,
        }
    }

    /// Override the source of "now" used for expiry checks
    pub fn with_clock(mut self, clock: fn() -> u64) -> Self {
        self.clock = clock;
        self
    }
}

impl Default for NameEntryValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator for NameEntryValidator {
    fn validate(&self, value: &[u8], author: &PeerId) -> NameStoreResult<bool> {
        let entry =
            NameEntry::unmarshal(value).map_err(|e| NameStoreError::Validation(e.to_string()))?;
        let public_key = author
            .public_key()
            .map_err(|e| NameStoreError::Validation(e.to_string()))?;

        if let Some(embedded) = &entry.public_key {
            if embedded.as_slice() != author.as_bytes() {
                debug!(author = %author, "Embedded public key does not match author");
                return Ok(false);
            }
        }

        if entry.is_expired((self.clock)()) {
            debug!(author = %author, validity = entry.validity, "Entry has expired");
            return Ok(false);
        }

        Ok(Keypair::verify(
            &public_key,
            &entry.signing_payload(),
            &entry.signature,
        ))
    }

    fn select(&self, received: &[u8], current: &[u8]) -> NameStoreResult<bool> {
        let received =
            NameEntry::unmarshal(received).map_err(|e| NameStoreError::Validation(e.to_string()))?;
        let current =
            NameEntry::unmarshal(current).map_err(|e| NameStoreError::Validation(e.to_string()))?;

        Ok(received.sequence > current.sequence)
    }
}
