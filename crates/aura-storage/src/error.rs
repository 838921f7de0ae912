//! Storage errors

/// Storage error
///
/// Carried by the futures adapters return. Messages are kept as strings so
/// one failure can be handed to every queued operation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StorageError {
    /// The adapter was torn down
    #[error("storage {0} is not available")]
    NotReady(String),

    /// The backing database could not be opened
    #[error("failed to open database: {0}")]
    OpenFailed(String),

    /// A single item exceeds the per-item ceiling
    #[error("item {key} is too large ({size} bytes, limit {limit})")]
    ItemTooLarge { key: String, size: usize, limit: usize },

    /// A database operation failed
    #[error("transaction failed: {0}")]
    Transaction(String),

    #[error("failed to decode stored value: {0}")]
    Decode(String),

    #[error("failed to encode value: {0}")]
    Encode(String),

    #[error("storage {0} not found")]
    NotFound(String),

    #[error("no storage adapter registered as {0}")]
    UnknownAdapter(String),

    /// The operation was dropped before it could complete
    #[error("storage operation cancelled")]
    Cancelled,
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            Self::Decode(err.to_string())
        } else {
            Self::Encode(err.to_string())
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;
