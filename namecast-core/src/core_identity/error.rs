//! Identity error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentityError {
    /// Text that does not decode to a 32-byte Ed25519 public key
    #[error("Invalid peer id '{id}': {reason}")]
    InvalidPeerId { id: String, reason: String },

    #[error("Invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("Identity I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Identity serialization error: {0}")]
    Serialization(String),
}

pub type IdentityResult<T> = Result<T, IdentityError>;
