use thiserror::Error;

/// Errors reported by a pubsub transport
#[derive(Debug, Clone, Error)]
pub enum PubsubError {
    #[error("Subscribe failed: {0}")]
    Subscribe(String),

    #[error("Publish failed: {0}")]
    Publish(String),

    /// The transport has been shut down
    #[error("Transport closed")]
    Closed,
}

pub type PubsubResult<T> = Result<T, PubsubError>;
