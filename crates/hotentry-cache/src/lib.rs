//! Cache key derivation, TTL policy and cache store backends for hotentry.

pub mod bucketed;
pub mod keys;
pub mod layered;
pub mod moka;
pub mod redis;
pub mod ttl;

pub use bucketed::{ArchiveLookup, PastBucket, TimeBucketedCache, TodayBucket};
pub use hotentry_core::{CacheError, CacheStore};
pub use keys::ListMode;
pub use layered::LayeredCacheStore;
pub use self::moka::MokaCacheStore;
pub use self::redis::RedisCacheStore;
pub use ttl::{Freshness, TtlPolicy};
