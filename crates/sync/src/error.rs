use thiserror::Error;

use pantry_core::DomainError;
use pantry_store::StoreError;

/// Failure of a sync-core operation.
///
/// Store failures fold into `StoreUnavailable`, except a key the backend
/// rejects, which is the caller's input and so `InvalidArgument`. The cache is
/// left at its last successfully refreshed value.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Rejected input (e.g. an empty item name). The store was not touched.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A domain invariant would be broken by the requested change.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// Any failure talking to the store (network, remote status, decoding).
    #[error("store unavailable: {0}")]
    StoreUnavailable(StoreError),
}

impl From<DomainError> for SyncError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => SyncError::InvalidArgument(msg),
            DomainError::InvariantViolation(msg) => SyncError::InvariantViolation(msg),
        }
    }
}

impl From<StoreError> for SyncError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::InvalidKey(msg) => SyncError::InvalidArgument(msg),
            other => SyncError::StoreUnavailable(other),
        }
    }
}
