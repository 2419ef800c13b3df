/// Errors from the key-value store and its repositories.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A value could not be serialised, or the backing document is not
    /// valid JSON.
    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backend is unusable (e.g. a poisoned lock).
    #[error("Storage backend error: {0}")]
    Backend(String),
}
