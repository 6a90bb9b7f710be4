//! Metrics for the naming subsystem
//!
//! Counters go through the `metrics` facade. Without an installed recorder
//! every call is a no-op, so the library never requires an exporter.

use metrics::{counter, describe_counter};

pub const PUBLISH: &str = "namesys.pubsub.publish";
pub const SUBSCRIBE: &str = "namesys.pubsub.subscribe";
pub const MESSAGES_RECEIVED: &str = "namesys.pubsub.messages.received";
pub const MESSAGES_IGNORED_SELF: &str = "namesys.pubsub.messages.ignored_self";
pub const MESSAGES_REJECTED: &str = "namesys.pubsub.messages.rejected";
pub const MESSAGES_STALE: &str = "namesys.pubsub.messages.stale";
pub const RECORDS_STORED: &str = "namesys.pubsub.records.stored";
pub const RECORDS_STORE_FAILED: &str = "namesys.pubsub.records.store_failed";
pub const RESOLVE_TOTAL: &str = "namesys.resolve.total";
pub const RESOLVE_CACHE_HITS: &str = "namesys.resolve.cache_hits";

/// Register descriptions with the installed recorder
pub fn init_metrics() {
    describe_counter!(PUBLISH, "Values published on a record topic");
    describe_counter!(SUBSCRIBE, "Record topics subscribed");
    describe_counter!(MESSAGES_RECEIVED, "Pubsub messages delivered to record handlers");
    describe_counter!(MESSAGES_IGNORED_SELF, "Messages skipped because this node sent them");
    describe_counter!(MESSAGES_REJECTED, "Messages dropped as malformed or invalid");
    describe_counter!(MESSAGES_STALE, "Valid messages not newer than the cached record");
    describe_counter!(RECORDS_STORED, "Received records persisted to the local datastore");
    describe_counter!(RECORDS_STORE_FAILED, "Received records that failed to persist");
    describe_counter!(RESOLVE_TOTAL, "Name resolutions attempted");
    describe_counter!(RESOLVE_CACHE_HITS, "Name resolutions answered from cache");
}

/// Increment a counter by one
pub fn increment(name: &'static str) {
    counter!(name).increment(1);
}
