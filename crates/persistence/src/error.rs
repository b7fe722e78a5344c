use thiserror::Error;

/// Errors that can occur when reading or writing persisted session state.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The stored blob could not be read back as a session snapshot.
    #[error("Persisted snapshot under '{key}' is corrupted: {reason}")]
    Corrupted { key: String, reason: String },

    /// The stored snapshot was written by an incompatible schema.
    #[error("Unsupported snapshot schema version {found} (expected {expected})")]
    UnsupportedSchema { found: u32, expected: u32 },

    /// The storage backend rejected the operation.
    #[error("Storage backend error: {0}")]
    Storage(String),

    /// A filesystem error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A serialization error occurred while writing.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PersistenceError {
    /// Returns true if the stored data is unreadable rather than unreachable.
    ///
    /// Corrupted data degrades to an empty session; backend failures do not
    /// say anything about the stored contents.
    pub fn is_corrupted(&self) -> bool {
        matches!(
            self,
            PersistenceError::Corrupted { .. } | PersistenceError::UnsupportedSchema { .. }
        )
    }
}

/// Result type for persistence operations.
pub type Result<T> = std::result::Result<T, PersistenceError>;
