use thiserror::Error;

/// Errors from a local datastore backend
#[derive(Debug, Error)]
pub enum DatastoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    /// Connection pool exhausted or misconfigured
    #[error("Pool error: {0}")]
    Pool(String),
}

impl From<rusqlite::Error> for DatastoreError {
    fn from(err: rusqlite::Error) -> Self {
        DatastoreError::Storage(err.to_string())
    }
}

impl From<r2d2::Error> for DatastoreError {
    fn from(err: r2d2::Error) -> Self {
        DatastoreError::Pool(err.to_string())
    }
}

impl From<std::io::Error> for DatastoreError {
    fn from(err: std::io::Error) -> Self {
        DatastoreError::Storage(err.to_string())
    }
}

pub type DatastoreResult<T> = Result<T, DatastoreError>;
