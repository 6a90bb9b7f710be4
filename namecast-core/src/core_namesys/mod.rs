//! Naming over pubsub
//!
//! - `pubsub_store`: the record store relaying name records over pubsub
//! - `resolver`: `/ipns/` name resolution on top of the store
//! - `name_pubsub`: state and subscription listing

pub mod errors;
pub mod name_pubsub;
pub mod pubsub_store;
pub mod resolver;

#[cfg(test)]
mod tests;

pub use errors::{NameStoreError, NameStoreResult};
pub use name_pubsub::{NamePubsub, PubsubState};
pub use pubsub_store::{PubsubRecordStore, RecordEvent, RejectReason, StoreOptions};
pub use resolver::{NameResolver, ResolveOptions, ResolverOptions};
