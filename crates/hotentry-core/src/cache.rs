use crate::error::CacheError;
use async_trait::async_trait;
use std::time::Duration;

/// Result type for cache store operations.
pub type Result<T> = std::result::Result<T, CacheError>;

/// A shared key-value store with per-key expiry.
///
/// Implementations can use Redis, in-memory caches, or other backends.
/// Payloads are opaque bytes; the caller owns serialization.
#[async_trait]
pub trait CacheStore: Send + Sync + 'static {
    /// Get the payload stored under `key`.
    ///
    /// Returns `Ok(None)` if the key is not in the cache; a miss is not an error.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `value` under `key`, expiring `ttl` after the write.
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()>;

    /// Remove `key`. It is not an error if the key does not exist.
    async fn delete(&self, key: &str) -> Result<()>;
}
