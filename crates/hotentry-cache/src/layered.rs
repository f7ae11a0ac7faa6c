use std::time::Duration;

use async_trait::async_trait;
use hotentry_core::cache::Result;
use hotentry_core::CacheStore;
use tracing::{debug, trace, warn};

/// Longest time an entry lives in L1 by default.
pub const DEFAULT_L1_MAX_TTL: Duration = Duration::from_secs(60);

/// A two-level cache store: a fast local L1 in front of a shared L2.
///
/// - **Get**: L1 first; on an L1 miss, L2. An L2 hit is backfilled into L1.
/// - **Set**: write-through to L2, then L1.
/// - **Delete**: both layers.
///
/// L1 TTLs are capped at `l1_max_ttl`, which bounds how long one node can
/// serve a value after another node deleted or replaced it in L2.
#[derive(Debug, Clone)]
pub struct LayeredCacheStore<L1, L2> {
    l1: L1,
    l2: L2,
    l1_max_ttl: Duration,
}

impl<L1, L2> LayeredCacheStore<L1, L2> {
    pub fn new(l1: L1, l2: L2) -> Self {
        Self::with_l1_max_ttl(l1, l2, DEFAULT_L1_MAX_TTL)
    }

    pub fn with_l1_max_ttl(l1: L1, l2: L2, l1_max_ttl: Duration) -> Self {
        Self {
            l1,
            l2,
            l1_max_ttl,
        }
    }

    pub fn l1(&self) -> &L1 {
        &self.l1
    }

    pub fn l2(&self) -> &L2 {
        &self.l2
    }

    pub fn into_inner(self) -> (L1, L2) {
        (self.l1, self.l2)
    }

    fn l1_ttl(&self, ttl: Duration) -> Duration {
        ttl.min(self.l1_max_ttl)
    }
}

#[async_trait]
impl<L1, L2> CacheStore for LayeredCacheStore<L1, L2>
where
    L1: CacheStore,
    L2: CacheStore,
{
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        trace!(key = %key, "Fetching from layered cache");

        if let Some(value) = self.l1.get(key).await? {
            debug!(key = %key, "L1 cache hit");
            return Ok(Some(value));
        }
        trace!(key = %key, "L1 cache miss, trying L2");

        match self.l2.get(key).await? {
            Some(value) => {
                debug!(key = %key, "L2 cache hit, backfilling L1");
                // The remaining L2 lifetime is unknown; the cap bounds the overshoot.
                if let Err(e) = self.l1.set(key, &value, self.l1_max_ttl).await {
                    warn!(key = %key, error = %e, "Failed to backfill L1");
                }
                Ok(Some(value))
            }
            None => {
                trace!(key = %key, "L2 cache miss");
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        trace!(key = %key, "Storing in layered cache");

        self.l2.set(key, value, ttl).await?;
        self.l1.set(key, value, self.l1_ttl(ttl)).await?;
        debug!(key = %key, "Stored in L2 and L1");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        trace!(key = %key, "Removing from layered cache");

        self.l1.delete(key).await?;
        self.l2.delete(key).await?;
        debug!(key = %key, "Removed from L1 and L2");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MokaCacheStore;
    use hotentry_core::CacheError;

    /// An L1 that never holds anything and rejects writes.
    struct BrokenL1;

    #[async_trait]
    impl CacheStore for BrokenL1 {
        async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>> {
            Ok(None)
        }

        async fn set(&self, _key: &str, _value: &[u8], _ttl: Duration) -> Result<()> {
            Err(CacheError::Unavailable("l1 full".into()))
        }

        async fn delete(&self, _key: &str) -> Result<()> {
            Ok(())
        }
    }

    fn create_test_cache() -> LayeredCacheStore<MokaCacheStore, MokaCacheStore> {
        LayeredCacheStore::with_l1_max_ttl(
            MokaCacheStore::with_capacity(100),
            MokaCacheStore::with_capacity(100),
            Duration::from_millis(50),
        )
    }

    const HOUR: Duration = Duration::from_secs(3600);

    #[tokio::test]
    async fn get_prefers_l1() {
        let cache = create_test_cache();
        cache.l1().set("k", b"l1", HOUR).await.unwrap();
        cache.l2().set("k", b"l2", HOUR).await.unwrap();

        assert_eq!(cache.get("k").await.unwrap(), Some(b"l1".to_vec()));
    }

    #[tokio::test]
    async fn get_backfills_l1_from_l2() {
        let cache = create_test_cache();
        cache.l2().set("k", b"v", HOUR).await.unwrap();
        assert!(cache.l1().get("k").await.unwrap().is_none());

        assert_eq!(cache.get("k").await.unwrap(), Some(b"v".to_vec()));
        assert_eq!(cache.l1().get("k").await.unwrap(), Some(b"v".to_vec()));
    }

    #[tokio::test]
    async fn failed_backfill_still_returns_l2_value() {
        let cache = LayeredCacheStore::new(BrokenL1, MokaCacheStore::with_capacity(100));
        cache.l2().set("k", b"v", HOUR).await.unwrap();

        assert_eq!(cache.get("k").await.unwrap(), Some(b"v".to_vec()));
    }

    #[tokio::test]
    async fn set_writes_both_layers() {
        let cache = create_test_cache();
        cache.set("k", b"v", HOUR).await.unwrap();

        assert_eq!(cache.l1().get("k").await.unwrap(), Some(b"v".to_vec()));
        assert_eq!(cache.l2().get("k").await.unwrap(), Some(b"v".to_vec()));
    }

    #[tokio::test]
    async fn l1_ttl_is_capped() {
        let cache = create_test_cache();
        cache.set("k", b"v", HOUR).await.unwrap();

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(cache.l1().get("k").await.unwrap().is_none());
        assert_eq!(cache.l2().get("k").await.unwrap(), Some(b"v".to_vec()));
    }

    #[tokio::test]
    async fn delete_removes_from_both() {
        let cache = create_test_cache();
        cache.set("k", b"v", HOUR).await.unwrap();

        cache.delete("k").await.unwrap();

        assert!(cache.l1().get("k").await.unwrap().is_none());
        assert!(cache.l2().get("k").await.unwrap().is_none());
        assert!(cache.get("k").await.unwrap().is_none());
    }
}
