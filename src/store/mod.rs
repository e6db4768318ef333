pub mod file;
pub mod reports;
pub mod users;

/// Store-level failure: lookup misses, input validation, credential hashing,
/// and file persistence. One enum for the whole layer so services map it to
/// an HTTP error in a single `From`.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Duplicate(String),
    #[error("{0}")]
    InvalidInput(String),
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("hashing error: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}
