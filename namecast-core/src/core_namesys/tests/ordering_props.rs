//! Ordering properties of the record store
//!
//! Whatever order versions of one name arrive in, the cached record ends up
//! being the highest sequence seen.

use proptest::prelude::*;
use std::sync::Arc;

use super::HANDLER_WAIT;
use crate::core_datastore::{Datastore, MemoryDatastore};
use crate::core_identity::Keypair;
use crate::core_namesys::PubsubRecordStore;
use crate::core_record::{NameEntry, NameEntryValidator, Record, RecordKey};
use crate::test_utils::{ipns_record, next_event, StubTransport};

/// Deliver one version per sequence, in the given order, and return the
/// sequence of the cached record
fn settle(sequences: &[u64]) -> u64 {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    runtime.block_on(async {
        let author = Keypair::generate();
        let key = RecordKey::for_peer(&author.peer_id());
        let transport = Arc::new(StubTransport::new());
        let datastore = MemoryDatastore::new();
        let store = PubsubRecordStore::new(
            transport.clone(),
            Arc::new(datastore.clone()),
            Keypair::generate().peer_id(),
            Arc::new(NameEntryValidator::new()),
        );
        let _ = store.get(&key).await;

        let mut events = store.subscribe_events();
        for seq in sequences {
            let (_, bytes) = ipns_record(&author, &format!("/ipfs/Qm{}", seq), *seq);
            transport.deliver(key.as_str(), bytes, author.peer_id()).await;
        }
        for _ in sequences {
            next_event(&mut events, HANDLER_WAIT).await.unwrap();
        }

        let cached = datastore.get(&key).await.unwrap();
        let record = Record::from_bytes(&cached).unwrap();
        NameEntry::unmarshal(&record.value).unwrap().sequence
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_two_versions_either_order(a in 0u64..1000, b in 0u64..1000) {
        prop_assume!(a != b);
        let newer = a.max(b);

        prop_assert_eq!(settle(&[a, b]), newer);
        prop_assert_eq!(settle(&[b, a]), newer);
    }

    #[test]
    fn prop_any_arrival_order_keeps_highest(
        sequences in prop::collection::vec(0u64..50, 1..12),
    ) {
        let highest = sequences.iter().copied().max().unwrap();
        prop_assert_eq!(settle(&sequences), highest);
    }
}
