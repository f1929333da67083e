//! Error types for ledger storage.

use finapp_core::LedgerError;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
///
/// Adapters translate backend-native failures into this enum; the engine only
/// ever sees the `LedgerError` it converts into.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A concurrent transaction touched the same rows; the unit of work may
    /// be retried.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A primary key already exists.
    #[error("duplicate {entity}: {id}")]
    Duplicate {
        /// The kind of record.
        entity: &'static str,
        /// The duplicated key.
        id: String,
    },
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Database(msg) => Self::Storage(msg),
            StoreError::Serialization(msg) => Self::Serialization(msg),
            StoreError::Conflict(msg) => Self::Conflict(msg),
            StoreError::Duplicate { entity, id } => Self::DuplicateId { entity, id },
        }
    }
}
