//! Store-level error types.

use ledgerline_core::LedgerError;

/// Errors raised by a [`LedgerStore`](crate::store::LedgerStore) backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A row that the operation requires does not exist.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A uniqueness constraint was violated.
    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    /// The row changed since it was read.
    #[error("Version conflict on {entity}: expected {expected}, found {found}")]
    VersionConflict {
        /// Entity description.
        entity: String,
        /// Version the caller read.
        expected: u64,
        /// Version currently stored.
        found: u64,
    },

    /// A stored amount would leave the supported decimal range.
    #[error("Amount out of range: {0}")]
    Overflow(String),

    /// The tenant's unit of work could not be opened in time.
    #[error("Timed out waiting for the tenant transaction")]
    Timeout,

    /// Any other backend failure.
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(_) | StoreError::VersionConflict { .. } => {
                Self::ConcurrentModification
            }
            StoreError::Overflow(_) => Self::AmountOverflow,
            StoreError::NotFound(_) | StoreError::Timeout | StoreError::Backend(_) => {
                Self::Storage(err.to_string())
            }
        }
    }
}
