use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode cache entry: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("failed to decode cache entry: {0}")]
    Deserialize(#[source] serde_json::Error),

    /// Deleting an entry that does not exist is an error, not a no-op.
    /// Callers that want idempotent cleanup must check [`exists`] first.
    ///
    /// [`exists`]: crate::ResponseStore::exists
    #[error("no cache entry to delete at {0}")]
    Delete(PathBuf),
}

pub type Result<T> = std::result::Result<T, StoreError>;
