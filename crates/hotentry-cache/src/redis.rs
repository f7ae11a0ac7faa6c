use std::time::Duration;

use async_trait::async_trait;
use hotentry_core::cache::Result;
use hotentry_core::{CacheError, CacheStore};
use redis::AsyncCommands;
use tracing::{debug, trace, warn};

/// Namespace applied to every key unless overridden.
pub const DEFAULT_KEY_PREFIX: &str = "he:";

/// A Redis-backed [`CacheStore`].
///
/// Payloads are stored as raw bytes with `SET ... EX`, under a namespace
/// prefix shared by every process of a deployment.
#[derive(Debug, Clone)]
pub struct RedisCacheStore {
    conn: redis::aio::MultiplexedConnection,
    key_prefix: String,
}

fn map_redis_error(operation: &str, err: redis::RedisError) -> CacheError {
    let message = format!("{operation}: {err}");
    if message.to_ascii_lowercase().contains("timed out") {
        CacheError::Timeout(message)
    } else {
        CacheError::Operation(message)
    }
}

impl RedisCacheStore {
    pub fn new(conn: redis::aio::MultiplexedConnection) -> Self {
        Self::with_prefix(conn, DEFAULT_KEY_PREFIX)
    }

    /// Creates a store with a custom key prefix (e.g. `"staging:he:"`).
    pub fn with_prefix(
        conn: redis::aio::MultiplexedConnection,
        key_prefix: impl Into<String>,
    ) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.into(),
        }
    }

    /// Opens a client for `url` and wraps a multiplexed connection to it.
    pub async fn connect(url: &str, key_prefix: impl Into<String>) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| CacheError::Initialization(format!("invalid Redis url: {e}")))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| map_redis_error("failed to connect to Redis", e))?;
        Ok(Self::with_prefix(conn, key_prefix))
    }

    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    fn cache_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let full_key = self.cache_key(key);
        trace!(key = %full_key, "Fetching from Redis cache");

        let mut conn = self.conn.clone();
        match conn.get::<_, Option<Vec<u8>>>(&full_key).await {
            Ok(Some(bytes)) => {
                debug!(key = %full_key, "Cache hit in Redis");
                Ok(Some(bytes))
            }
            Ok(None) => {
                trace!(key = %full_key, "Cache miss in Redis");
                Ok(None)
            }
            Err(e) => {
                warn!(key = %full_key, error = %e, "Redis error on get");
                Err(map_redis_error("failed to fetch value from Redis", e))
            }
        }
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        let full_key = self.cache_key(key);
        // EX rejects zero; anything under a second rounds up.
        let seconds = ttl.as_secs().max(1);
        trace!(key = %full_key, ttl_secs = seconds, "Storing in Redis cache");

        let mut conn = self.conn.clone();
        match conn.set_ex::<_, _, ()>(&full_key, value, seconds).await {
            Ok(()) => {
                debug!(key = %full_key, "Cached value in Redis");
                Ok(())
            }
            Err(e) => {
                warn!(key = %full_key, error = %e, "Failed to cache value in Redis");
                Err(map_redis_error("failed to write value to Redis", e))
            }
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let full_key = self.cache_key(key);
        trace!(key = %full_key, "Removing from Redis cache");

        let mut conn = self.conn.clone();
        match conn.del::<_, ()>(&full_key).await {
            Ok(()) => {
                debug!(key = %full_key, "Removed value from Redis cache");
                Ok(())
            }
            Err(e) => {
                warn!(key = %full_key, error = %e, "Failed to remove value from Redis cache");
                Err(map_redis_error("failed to delete value from Redis", e))
            }
        }
    }
}
