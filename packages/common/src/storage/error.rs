use thiserror::Error;

/// Errors that can occur during blob storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No blob is stored under the requested key.
    #[error("blob not found: {0}")]
    NotFound(String),

    /// Reading the source stream or touching the blob directory failed.
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A digest string could not be parsed.
    #[error("invalid content hash: {0}")]
    InvalidHash(String),

    /// The stream grew past the configured size limit.
    #[error("blob exceeds size limit ({actual} > {limit} bytes)")]
    SizeLimitExceeded { actual: u64, limit: u64 },
}
