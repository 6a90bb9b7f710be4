//! Test fixtures for creating signed name entries and record envelopes
//!
//! Provides builder patterns and factory functions for creating test data.

use crate::core_identity::Keypair;
use crate::core_record::{current_timestamp, NameEntry, Record, RecordKey};

/// Builder for signed name entries
pub struct EntryBuilder {
    value: String,
    sequence: u64,
    validity: u64,
    ttl: u64,
    public_key: Option<Vec<u8>>,
}

impl EntryBuilder {
    /// Valid for an hour from now
    pub fn new(value: impl Into<String>, sequence: u64) -> Self {
        Self {
            value: value.into(),
            sequence,
            validity: current_timestamp() + 3600,
            ttl: 60,
            public_key: None,
        }
    }

    pub fn validity(mut self, validity: u64) -> Self {
        self.validity = validity;
        self
    }

    pub fn ttl(mut self, ttl: u64) -> Self {
        self.ttl = ttl;
        self
    }

    /// Embed a public key in the entry
    pub fn public_key(mut self, key: Vec<u8>) -> Self {
        self.public_key = Some(key);
        self
    }

    pub fn sign(self, keypair: &Keypair) -> NameEntry {
        let mut entry = NameEntry {
            value: self.value,
            sequence: self.sequence,
            validity: self.validity,
            ttl: self.ttl,
            signature: Vec::new(),
            public_key: self.public_key,
        };
        entry.signature = keypair.sign(&entry.signing_payload());
        entry
    }
}

/// Entry signed by `keypair`, valid for an hour
pub fn signed_entry(keypair: &Keypair, value: &str, sequence: u64) -> NameEntry {
    EntryBuilder::new(value, sequence).sign(keypair)
}

/// Serialized envelope of `entry` under `key`, authored by `keypair`
pub fn envelope_bytes(keypair: &Keypair, key: &RecordKey, entry: &NameEntry) -> Vec<u8> {
    Record::new(key.clone(), entry.marshal().unwrap(), keypair.peer_id())
        .to_bytes()
        .unwrap()
}

/// Serialized, signed record for `keypair`'s own `/ipns/` name
pub fn ipns_record(keypair: &Keypair, value: &str, sequence: u64) -> (RecordKey, Vec<u8>) {
    let key = RecordKey::for_peer(&keypair.peer_id());
    let bytes = envelope_bytes(keypair, &key, &signed_entry(keypair, value, sequence));
    (key, bytes)
}

/// Envelope with an arbitrary opaque value, for stub validators
pub fn opaque_record(key: &RecordKey, value: &[u8], author: &Keypair) -> Vec<u8> {
    Record::new(key.clone(), value.to_vec(), author.peer_id())
        .to_bytes()
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_signs_final_fields() {
        let kp = Keypair::generate();
        let entry = EntryBuilder::new("/ipfs/QmA", 7).ttl(5).validity(99).sign(&kp);

        assert_eq!(entry.sequence, 7);
        assert_eq!(entry.ttl, 5);
        assert_eq!(entry.validity, 99);
        assert_eq!(entry.signature.len(), 64);
    }

    #[test]
    fn test_ipns_record_decodes() {
        let kp = Keypair::generate();
        let (key, bytes) = ipns_record(&kp, "/ipfs/QmA", 1);

        let record = Record::from_bytes(&bytes).unwrap();
        assert_eq!(record.key, key);
        assert_eq!(record.author, kp.peer_id());
        assert_eq!(NameEntry::unmarshal(&record.value).unwrap().value, "/ipfs/QmA");
    }
}
