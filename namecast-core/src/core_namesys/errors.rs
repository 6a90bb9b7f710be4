/*
    errors.rs - Error types for the naming subsystem

    Covers the record store's synchronous paths (put/get), the validator
    capability, and name resolution. Errors on the asynchronous message path
    never leave the handler; they are logged and turned into events.
*/

use thiserror::Error;

use crate::core_datastore::DatastoreError;
use crate::core_pubsub::PubsubError;

#[derive(Debug, Error)]
pub enum NameStoreError {
    /// Key is not a well-formed record key
    #[error("datastore key does not have a valid format: {0}")]
    InvalidKey(String),

    /// Value cannot be published as a record payload
    #[error("received value is not valid: {0}")]
    InvalidValue(String),

    #[error("cannot subscribe topic {topic}: {source}")]
    SubscriptionFailed {
        topic: String,
        #[source]
        source: PubsubError,
    },

    #[error("local record requested was not found for {0}")]
    NoLocalRecord(String),

    /// Bytes that could not be decoded as a record
    #[error("found record that we couldn't convert to a value: {0}")]
    InvalidRecord(String),

    #[error("validator does not have the validate function")]
    NoValidateFunction,

    #[error("validator does not have the select function")]
    NoSelectFunction,

    /// The validator could not reach a verdict
    #[error("record validation failed: {0}")]
    Validation(String),

    #[error("publish failed: {0}")]
    Publish(#[from] PubsubError),

    #[error(transparent)]
    Datastore(#[from] DatastoreError),

    #[error("record for {name} expired at {expired_at}")]
    RecordExpired { name: String, expired_at: u64 },

    #[error("could not resolve name {name} within {depth} steps")]
    ResolveDepthExceeded { name: String, depth: usize },

    #[error("IPNS pubsub subsystem is not enabled")]
    NotEnabled,

    #[error("invalid name {name}: {reason}")]
    InvalidName { name: String, reason: String },
}

impl NameStoreError {
    /// Stable machine-readable code, shared with other implementations of
    /// the same protocol
    pub fn code(&self) -> &'static str {
        match self {
            NameStoreError::InvalidKey(_) => "ERR_INVALID_DATASTORE_KEY",
            NameStoreError::InvalidValue(_) => "ERR_INVALID_VALUE_RECEIVED",
            NameStoreError::SubscriptionFailed { .. } => "ERR_SUBSCRIBING_TOPIC",
            NameStoreError::NoLocalRecord(_) => "ERR_NO_LOCAL_RECORD_FOUND",
            NameStoreError::InvalidRecord(_) => "ERR_INVALID_RECORD_RECEIVED",
            NameStoreError::NoValidateFunction => "ERR_NO_VALIDATE_FUNCTION_FOUND",
            NameStoreError::NoSelectFunction => "ERR_NO_SELECT_FUNCTION_FOUND",
            NameStoreError::Validation(_) => "ERR_INVALID_RECORD",
            NameStoreError::Publish(_) => "ERR_PUBLISHING",
            NameStoreError::Datastore(_) => "ERR_DATASTORE",
            NameStoreError::RecordExpired { .. } => "ERR_RECORD_EXPIRED",
            NameStoreError::ResolveDepthExceeded { .. } => "ERR_RESOLVE_RECURSION_LIMIT",
            NameStoreError::NotEnabled => "ERR_IPNS_PS_NOT_ENABLED",
            NameStoreError::InvalidName { .. } => "ERR_INVALID_NAME",
        }
    }

    /// Whether retrying `get` later may succeed once gossip catches up
    pub fn is_not_yet_resolved(&self) -> bool {
        matches!(self, NameStoreError::NoLocalRecord(_))
    }
}

pub type NameStoreResult<T> = Result<T, NameStoreError>;
