pub mod config;
pub mod core_datastore;
pub mod core_identity;
pub mod core_namesys;
pub mod core_pubsub;
pub mod core_record;
pub mod logging;
pub mod metrics;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::Config;
pub use core_datastore::{Datastore, MemoryDatastore, SqliteDatastore};
pub use core_identity::{Keypair, PeerId};
pub use core_namesys::{
    NamePubsub, NameResolver, NameStoreError, NameStoreResult, PubsubRecordStore, RecordEvent,
    ResolveOptions,
};
pub use core_pubsub::{MemoryNetwork, MemoryPubsub, PubsubMessage, PubsubTransport};
pub use core_record::{NameEntry, NameEntryValidator, Record, RecordKey, Validator};
pub use logging::{init_logging, LogLevel};
