use jiff::Timestamp;
use thiserror::Error;

/// Rejected request parameters. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid range: from {from} is after to {to}")]
    InvalidRange { from: Timestamp, to: Timestamp },
    #[error("invalid sort mode: '{0}'")]
    InvalidSort(String),
    #[error("invalid threshold {0}; expected one of 5, 10, 50, 100, 500, 1000")]
    InvalidThreshold(i64),
    #[error("invalid period: {0}")]
    InvalidPeriod(String),
    #[error("invalid entry: {0}")]
    InvalidEntry(String),
}

/// Errors raised by an entry or tag store.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("storage operation failed: {0}")]
    Operation(String),
}

#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache operation timed out: {0}")]
    Timeout(String),
    #[error("cache serialization failed: {0}")]
    Serialization(String),
    #[error("cache value is invalid: {0}")]
    InvalidData(String),
    #[error("cache initialization failed: {0}")]
    Initialization(String),
    #[error("cache operation failed: {0}")]
    Operation(String),
}

/// Returned when an operation observed its cancellation signal or deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation cancelled")]
pub struct Cancelled;
