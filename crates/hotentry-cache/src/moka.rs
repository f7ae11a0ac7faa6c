use std::time::{Duration, Instant};

use async_trait::async_trait;
use hotentry_core::cache::Result;
use hotentry_core::CacheStore;
use moka::future::Cache;
use moka::Expiry;
use tracing::{debug, trace};
use typed_builder::TypedBuilder;

/// A cached payload together with the TTL it was written with.
#[derive(Debug, Clone)]
struct Stored {
    bytes: Vec<u8>,
    ttl: Duration,
}

/// Expires each entry after the TTL passed to [`CacheStore::set`].
struct PerEntryTtl;

impl Expiry<String, Stored> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Stored,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Stored,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// An in-process cache store using Moka.
///
/// Suitable for single-node deployments, for tests, or as the L1 of a
/// [`LayeredCacheStore`](crate::LayeredCacheStore).
#[derive(Debug, Clone)]
pub struct MokaCacheStore {
    cache: Cache<String, Stored>,
}

impl MokaCacheStore {
    /// Creates a store holding at most 10,000 entries.
    pub fn new() -> Self {
        Self::with_capacity(10_000)
    }

    pub fn with_capacity(max_capacity: u64) -> Self {
        MokaConfig::builder().max_capacity(max_capacity).build().into()
    }

    pub fn builder() -> MokaConfigBuilder {
        MokaConfig::builder()
    }

    /// Number of live entries. Pending maintenance may make this lag.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Default for MokaCacheStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MokaCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        trace!(key = %key, "Fetching from Moka cache");

        match self.cache.get(key).await {
            Some(stored) => {
                debug!(key = %key, "Cache hit in Moka");
                Ok(Some(stored.bytes))
            }
            None => {
                trace!(key = %key, "Cache miss in Moka");
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        trace!(key = %key, ttl_secs = ttl.as_secs(), "Storing in Moka cache");

        let stored = Stored {
            bytes: value.to_vec(),
            ttl,
        };
        self.cache.insert(key.to_string(), stored).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        trace!(key = %key, "Removing from Moka cache");
        self.cache.invalidate(key).await;
        Ok(())
    }
}

/// Configuration for creating a [`MokaCacheStore`].
#[derive(Debug, TypedBuilder)]
pub struct MokaConfig {
    #[builder(default = 10_000)]
    max_capacity: u64,
}

impl From<MokaConfig> for MokaCacheStore {
    fn from(config: MokaConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(PerEntryTtl)
            .build();
        Self { cache }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_and_set() {
        let cache = MokaCacheStore::new();

        assert!(cache.get("k").await.unwrap().is_none());
        cache.set("k", b"payload", Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some(b"payload".to_vec()));
    }

    #[tokio::test]
    async fn set_overwrites() {
        let cache = MokaCacheStore::new();
        cache.set("k", b"one", Duration::from_secs(60)).await.unwrap();
        cache.set("k", b"two", Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some(b"two".to_vec()));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let cache = MokaCacheStore::new();
        cache.set("k", b"v", Duration::from_secs(60)).await.unwrap();

        cache.delete("k").await.unwrap();
        assert!(cache.get("k").await.unwrap().is_none());
        cache.delete("k").await.unwrap();
    }

    #[tokio::test]
    async fn entries_expire_after_their_own_ttl() {
        let cache = MokaCacheStore::new();
        cache.set("short", b"v", Duration::from_millis(50)).await.unwrap();
        cache.set("long", b"v", Duration::from_secs(60)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(cache.get("short").await.unwrap().is_none());
        assert!(cache.get("long").await.unwrap().is_some());
    }
}
