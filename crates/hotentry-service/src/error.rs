use hotentry_core::{Cancelled, StorageError, ValidationError};
use thiserror::Error;

/// Result type for list service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Errors returned to callers of [`ListService`](crate::ListService).
///
/// Cache failures never surface here; the cache layer absorbs them.
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("request cancelled")]
    Cancelled,
}

impl ServiceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::Storage(StorageError::NotFound(_)))
    }
}

impl From<Cancelled> for ServiceError {
    fn from(_: Cancelled) -> Self {
        ServiceError::Cancelled
    }
}
