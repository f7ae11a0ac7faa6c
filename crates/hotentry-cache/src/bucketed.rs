//! Read-through caching with TTLs chosen by time bucket.
//!
//! Archive counts are split into two sub-buckets: the volatile `today` row
//! and the immutable rows of closed days. Both are written together from a
//! single store call, and both must be present and computed today for a hit.

use std::future::Future;
use std::time::Duration;

use hotentry_core::{
    ArchiveCount, CacheStore, Cancellation, Cancelled, Clock, ListQuery, RankingPeriod, Threshold,
};
use jiff::civil::Date;
use jiff::Timestamp;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::keys::{self, ListMode};
use crate::ttl::{Freshness, TtlPolicy};

/// Cached count for the current day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodayBucket {
    /// Day the bucket was computed for.
    pub date: Date,
    pub row: Option<ArchiveCount>,
}

/// Cached counts for every closed day, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PastBucket {
    /// Day the bucket was computed on. Rows cover days strictly before it.
    pub as_of: Date,
    pub rows: Vec<ArchiveCount>,
}

/// Outcome of probing both archive sub-buckets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveLookup {
    BothHit {
        today: TodayBucket,
        past: PastBucket,
    },
    /// Exactly one sub-bucket is usable.
    PartialMiss,
    FullMiss,
}

impl ArchiveLookup {
    /// Classifies the buckets just read. A bucket computed on another day is
    /// treated as absent.
    pub fn classify(
        today: Date,
        today_bucket: Option<TodayBucket>,
        past: Option<PastBucket>,
    ) -> Self {
        let today_bucket = today_bucket.filter(|bucket| bucket.date == today);
        let past = past.filter(|bucket| bucket.as_of == today);

        match (today_bucket, past) {
            (Some(today), Some(past)) => ArchiveLookup::BothHit { today, past },
            (None, None) => ArchiveLookup::FullMiss,
            _ => ArchiveLookup::PartialMiss,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveLookup::BothHit { .. } => "both_hit",
            ArchiveLookup::PartialMiss => "partial_miss",
            ArchiveLookup::FullMiss => "full_miss",
        }
    }
}

/// Splits store rows into the two sub-buckets. Rows dated after `today`
/// belong to neither and are dropped.
pub fn split_archive(today: Date, rows: Vec<ArchiveCount>) -> (TodayBucket, PastBucket) {
    let row = rows.iter().find(|row| row.date == today).copied();
    let past = rows.into_iter().filter(|row| row.date < today).collect();
    (
        TodayBucket { date: today, row },
        PastBucket {
            as_of: today,
            rows: past,
        },
    )
}

/// Today's row (if it is dated today) ahead of the closed days.
pub fn merge_archive(
    today: Date,
    today_bucket: &TodayBucket,
    past: &PastBucket,
) -> Vec<ArchiveCount> {
    let mut rows = Vec::with_capacity(past.rows.len() + 1);
    if let Some(row) = today_bucket.row.filter(|row| row.date == today) {
        rows.push(row);
    }
    rows.extend(past.rows.iter().copied());
    rows
}

/// A cache-aside layer over a [`CacheStore`].
///
/// Reads fail open: a store error or an undecodable payload is logged and
/// handled as a miss. Writes are best effort. Concurrent misses on the same
/// key each recompute and the last write wins.
#[derive(Debug, Clone)]
pub struct TimeBucketedCache<C, K> {
    store: C,
    clock: K,
    policy: TtlPolicy,
}

impl<C, K> TimeBucketedCache<C, K>
where
    C: CacheStore,
    K: Clock,
{
    pub fn new(store: C, clock: K, policy: TtlPolicy) -> Self {
        Self {
            store,
            clock,
            policy,
        }
    }

    pub fn store(&self) -> &C {
        &self.store
    }

    pub fn clock(&self) -> &K {
        &self.clock
    }

    pub fn policy(&self) -> &TtlPolicy {
        &self.policy
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn today(&self) -> Date {
        self.policy.today(self.clock.now())
    }

    /// Returns the cached value under `key`, or computes and caches it.
    pub async fn read_through<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        cancel: &Cancellation,
        compute: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<Cancelled>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.read_through_with(key, || ttl, cancel, compute).await
    }

    /// Cached list, count or page for a normalized query.
    pub async fn list<T, E, F, Fut>(
        &self,
        mode: ListMode,
        query: &ListQuery,
        cancel: &Cancellation,
        compute: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<Cancelled>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let key = keys::list_key(mode, query);
        self.read_through(&key, self.policy.list_ttl(), cancel, compute)
            .await
    }

    pub async fn popular_tags<T, E, F, Fut>(
        &self,
        limit: i64,
        cancel: &Cancellation,
        compute: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<Cancelled>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let key = keys::popular_tags_key(limit);
        self.read_through(&key, self.policy.tags_ttl(), cancel, compute)
            .await
    }

    /// Cached ranking for `period`. The TTL is picked when the result is
    /// written, from the period's freshness at that moment.
    pub async fn ranking<T, E, F, Fut>(
        &self,
        period: &RankingPeriod,
        limit: i64,
        cancel: &Cancellation,
        compute: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<Cancelled>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let key = keys::ranking_key(period, limit);
        let ttl = || self.policy.period_ttl(period, self.clock.now());
        self.read_through_with(&key, ttl, cancel, compute).await
    }

    /// Per-day archive counts for `threshold`, newest day first.
    ///
    /// Unless both sub-buckets hit, `compute` runs exactly once and both
    /// sub-buckets are rewritten from its rows.
    pub async fn archive<E, F, Fut>(
        &self,
        threshold: Threshold,
        cancel: &Cancellation,
        compute: F,
    ) -> Result<Vec<ArchiveCount>, E>
    where
        E: From<Cancelled>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<ArchiveCount>, E>>,
    {
        let today = self.today();
        let today_key = keys::archive_today_key(threshold);
        let past_key = keys::archive_past_key(threshold);

        let today_bucket = self.read::<TodayBucket>(&today_key, cancel).await?;
        let past_bucket = self.read::<PastBucket>(&past_key, cancel).await?;

        match ArchiveLookup::classify(today, today_bucket, past_bucket) {
            ArchiveLookup::BothHit { today: hit, past } => {
                debug!(threshold = %threshold, "Archive cache hit");
                return Ok(merge_archive(today, &hit, &past));
            }
            lookup => {
                debug!(
                    threshold = %threshold,
                    state = lookup.as_str(),
                    "Archive cache miss, querying store"
                );
            }
        }

        let rows = cancel.run(compute()).await??;
        let (today_bucket, past_bucket) = split_archive(today, rows);

        if cancel.is_cancelled() {
            return Err(Cancelled.into());
        }
        let today_ttl = self.policy.day_ttl(Freshness::Current);
        let past_ttl = self.policy.day_ttl(Freshness::Past);
        // `past` before `today`: a cancel between the writes must not leave
        // the short-lived bucket behind on its own.
        self.write(&past_key, &past_bucket, past_ttl, cancel).await?;
        self.write(&today_key, &today_bucket, today_ttl, cancel)
            .await?;

        Ok(merge_archive(today, &today_bucket, &past_bucket))
    }

    /// Drops the volatile `today` archive bucket so the next read recomputes.
    pub async fn invalidate_today(&self, threshold: Threshold) {
        let key = keys::archive_today_key(threshold);
        if let Err(e) = self.store.delete(&key).await {
            warn!(key = %key, error = %e, "Failed to invalidate archive bucket");
        } else {
            debug!(key = %key, "Invalidated archive bucket");
        }
    }

    async fn read_through_with<T, E, F, Fut, G>(
        &self,
        key: &str,
        ttl: G,
        cancel: &Cancellation,
        compute: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<Cancelled>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        G: FnOnce() -> Duration,
    {
        if let Some(value) = self.read::<T>(key, cancel).await? {
            debug!(key = %key, "Cache hit");
            return Ok(value);
        }
        debug!(key = %key, "Cache miss, computing");

        let value = cancel.run(compute()).await??;

        if cancel.is_cancelled() {
            return Err(Cancelled.into());
        }
        self.write(key, &value, ttl(), cancel).await?;
        Ok(value)
    }

    async fn read<T>(&self, key: &str, cancel: &Cancellation) -> Result<Option<T>, Cancelled>
    where
        T: DeserializeOwned,
    {
        trace!(key = %key, "Probing cache");

        match cancel.run(self.store.get(key)).await? {
            Ok(Some(bytes)) => match serde_json::from_slice::<T>(&bytes) {
                Ok(value) => Ok(Some(value)),
                Err(e) => {
                    warn!(key = %key, error = %e, "Undecodable cache payload, treating as miss");
                    Ok(None)
                }
            },
            Ok(None) => Ok(None),
            Err(e) => {
                warn!(key = %key, error = %e, "Cache read failed, treating as miss");
                Ok(None)
            }
        }
    }

    async fn write<T>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
        cancel: &Cancellation,
    ) -> Result<(), Cancelled>
    where
        T: Serialize,
    {
        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to serialize value for caching");
                return Ok(());
            }
        };

        if let Err(e) = cancel.run(self.store.set(key, &bytes, ttl)).await? {
            warn!(key = %key, error = %e, "Cache write failed");
        } else {
            trace!(key = %key, ttl_secs = ttl.as_secs(), "Cached value");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hotentry_core::cache::Result as CacheResult;
    use hotentry_core::{CacheError, CancelHandle, ManualClock, TtlConfig};
    use jiff::civil::date;
    use jiff::tz::TimeZone;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Debug, PartialEq)]
    enum TestError {
        Cancelled,
        Store,
    }

    impl From<Cancelled> for TestError {
        fn from(_: Cancelled) -> Self {
            TestError::Cancelled
        }
    }

    /// Map-backed store that records TTLs and can be switched to failing.
    #[derive(Default)]
    struct RecordingStore {
        items: Mutex<HashMap<String, (Vec<u8>, Duration)>>,
        sets: AtomicUsize,
        written: Mutex<Vec<String>>,
        failing: AtomicBool,
        cancel_after_set: Mutex<Option<CancelHandle>>,
    }

    impl RecordingStore {
        fn ttl(&self, key: &str) -> Option<Duration> {
            self.items.lock().unwrap().get(key).map(|(_, ttl)| *ttl)
        }

        fn put_raw(&self, key: &str, bytes: &[u8]) {
            self.items
                .lock()
                .unwrap()
                .insert(key.to_string(), (bytes.to_vec(), Duration::from_secs(60)));
        }

        fn remove(&self, key: &str) {
            self.items.lock().unwrap().remove(key);
        }

        fn check(&self) -> CacheResult<()> {
            if self.failing.load(Ordering::SeqCst) {
                Err(CacheError::Unavailable("down".into()))
            } else {
                Ok(())
            }
        }
    }

    #[derive(Clone)]
    struct Shared(Arc<RecordingStore>);

    #[async_trait]
    impl CacheStore for Shared {
        async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
            self.0.check()?;
            Ok(self.0.items.lock().unwrap().get(key).map(|(b, _)| b.clone()))
        }

        async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> CacheResult<()> {
            self.0.check()?;
            self.0.sets.fetch_add(1, Ordering::SeqCst);
            self.0.written.lock().unwrap().push(key.to_string());
            self.0.items
                .lock()
                .unwrap()
                .insert(key.to_string(), (value.to_vec(), ttl));
            if let Some(handle) = self.0.cancel_after_set.lock().unwrap().take() {
                handle.cancel();
            }
            Ok(())
        }

        async fn delete(&self, key: &str) -> CacheResult<()> {
            self.0.check()?;
            self.0.remove(key);
            Ok(())
        }
    }

    struct Fixture {
        store: Arc<RecordingStore>,
        clock: ManualClock,
        cache: TimeBucketedCache<Shared, ManualClock>,
        calls: Arc<AtomicUsize>,
    }

    impl Fixture {
        fn new(now: &str) -> Self {
            let store = Arc::new(RecordingStore::default());
            let clock = ManualClock::new(now.parse().unwrap());
            let policy = TtlPolicy::new(TtlConfig::default(), TimeZone::UTC);
            let cache = TimeBucketedCache::new(Shared(Arc::clone(&store)), clock.clone(), policy);
            Self {
                store,
                clock,
                cache,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn compute<T>(
            &self,
            value: T,
        ) -> impl FnOnce() -> std::future::Ready<Result<T, TestError>> {
            let calls = Arc::clone(&self.calls);
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                std::future::ready(Ok(value))
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    fn row(y: i16, m: i8, d: i8, count: u64) -> ArchiveCount {
        ArchiveCount {
            date: date(y, m, d),
            count,
        }
    }

    fn store_rows() -> Vec<ArchiveCount> {
        vec![
            row(2024, 3, 10, 4),
            row(2024, 3, 9, 7),
            row(2024, 3, 1, 2),
        ]
    }

    fn threshold() -> Threshold {
        Threshold::new(5).unwrap()
    }

    #[tokio::test]
    async fn read_through_caches_computed_value() {
        let fixture = Fixture::new("2024-03-10T12:00:00Z");
        let cancel = Cancellation::never();
        let ttl = Duration::from_secs(30);

        let first: Vec<u32> = fixture
            .cache
            .read_through("k", ttl, &cancel, fixture.compute(vec![1, 2]))
            .await
            .unwrap();
        let second: Vec<u32> = fixture
            .cache
            .read_through("k", ttl, &cancel, fixture.compute(vec![9]))
            .await
            .unwrap();

        assert_eq!(first, vec![1, 2]);
        assert_eq!(second, vec![1, 2]);
        assert_eq!(fixture.calls(), 1);
        assert_eq!(fixture.store.ttl("k"), Some(ttl));
    }

    #[tokio::test]
    async fn compute_errors_are_not_cached() {
        let fixture = Fixture::new("2024-03-10T12:00:00Z");
        let cancel = Cancellation::never();

        let result: Result<u32, TestError> = fixture
            .cache
            .read_through("k", Duration::from_secs(30), &cancel, || async {
                Err(TestError::Store)
            })
            .await;

        assert_eq!(result, Err(TestError::Store));
        assert_eq!(fixture.store.sets.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn archive_full_miss_then_hit() {
        let fixture = Fixture::new("2024-03-10T12:00:00Z");
        let cancel = Cancellation::never();

        let rows = fixture
            .cache
            .archive(threshold(), &cancel, fixture.compute(store_rows()))
            .await
            .unwrap();
        assert_eq!(rows, store_rows());
        assert_eq!(fixture.calls(), 1);
        assert_eq!(
            fixture.store.ttl("archive:5:today"),
            Some(Duration::from_secs(600))
        );
        assert_eq!(
            fixture.store.ttl("archive:5:past"),
            Some(Duration::from_secs(86_400))
        );

        let again = fixture
            .cache
            .archive(threshold(), &cancel, fixture.compute(Vec::new()))
            .await
            .unwrap();
        assert_eq!(again, store_rows());
        assert_eq!(fixture.calls(), 1);
    }

    #[tokio::test]
    async fn archive_partial_miss_recomputes_once_and_rewrites_both() {
        let fixture = Fixture::new("2024-03-10T12:00:00Z");
        let cancel = Cancellation::never();
        fixture
            .cache
            .archive(threshold(), &cancel, fixture.compute(store_rows()))
            .await
            .unwrap();

        fixture.store.remove("archive:5:today");
        let sets_before = fixture.store.sets.load(Ordering::SeqCst);

        let mut updated = store_rows();
        updated[0].count = 5;
        let rows = fixture
            .cache
            .archive(threshold(), &cancel, fixture.compute(updated.clone()))
            .await
            .unwrap();

        assert_eq!(rows, updated);
        assert_eq!(fixture.calls(), 2);
        assert_eq!(fixture.store.sets.load(Ordering::SeqCst), sets_before + 2);
    }

    #[tokio::test]
    async fn archive_recomputes_after_day_rollover() {
        let fixture = Fixture::new("2024-03-10T12:00:00Z");
        let cancel = Cancellation::never();
        fixture
            .cache
            .archive(threshold(), &cancel, fixture.compute(store_rows()))
            .await
            .unwrap();

        fixture.clock.set("2024-03-11T00:05:00Z".parse().unwrap());
        let mut next_day = vec![row(2024, 3, 11, 1)];
        next_day.extend(store_rows());
        let rows = fixture
            .cache
            .archive(threshold(), &cancel, fixture.compute(next_day.clone()))
            .await
            .unwrap();

        assert_eq!(fixture.calls(), 2);
        assert_eq!(rows, next_day);
    }

    #[tokio::test]
    async fn archive_today_without_posts() {
        let fixture = Fixture::new("2024-03-12T12:00:00Z");
        let cancel = Cancellation::never();

        let rows = fixture
            .cache
            .archive(threshold(), &cancel, fixture.compute(store_rows()))
            .await
            .unwrap();
        assert_eq!(rows, store_rows());

        let cached = fixture
            .cache
            .archive(threshold(), &cancel, fixture.compute(Vec::new()))
            .await
            .unwrap();
        assert_eq!(cached, store_rows());
        assert_eq!(fixture.calls(), 1);
    }

    #[test]
    fn classify_requires_both_buckets_from_today() {
        let today = date(2024, 3, 10);
        let (fresh_today, fresh_past) = split_archive(today, store_rows());
        let (stale_today, stale_past) = split_archive(date(2024, 3, 9), store_rows());

        assert!(matches!(
            ArchiveLookup::classify(today, Some(fresh_today.clone()), Some(fresh_past.clone())),
            ArchiveLookup::BothHit { .. }
        ));
        assert_eq!(
            ArchiveLookup::classify(today, Some(fresh_today.clone()), None),
            ArchiveLookup::PartialMiss
        );
        assert_eq!(
            ArchiveLookup::classify(today, None, Some(fresh_past)),
            ArchiveLookup::PartialMiss
        );
        assert_eq!(
            ArchiveLookup::classify(today, Some(fresh_today), Some(stale_past)),
            ArchiveLookup::PartialMiss
        );
        assert_eq!(
            ArchiveLookup::classify(today, Some(stale_today), None),
            ArchiveLookup::FullMiss
        );
    }

    #[test]
    fn split_drops_future_rows_and_merge_puts_today_first() {
        let today = date(2024, 3, 10);
        let mut rows = vec![row(2024, 3, 12, 1)];
        rows.extend(store_rows());

        let (today_bucket, past) = split_archive(today, rows);
        assert_eq!(today_bucket.row, Some(row(2024, 3, 10, 4)));
        assert_eq!(past.rows, vec![row(2024, 3, 9, 7), row(2024, 3, 1, 2)]);
        assert_eq!(merge_archive(today, &today_bucket, &past), store_rows());

        // A today bucket from yesterday never leaks its row.
        assert_eq!(
            merge_archive(date(2024, 3, 11), &today_bucket, &past),
            past.rows
        );
    }

    #[tokio::test]
    async fn ranking_ttl_reflects_period_freshness() {
        let fixture = Fixture::new("2024-03-10T12:00:00Z");
        let cancel = Cancellation::never();
        let current = RankingPeriod::month(2024, 3).unwrap();
        let closed = RankingPeriod::month(2024, 2).unwrap();

        let _: Vec<u32> = fixture
            .cache
            .ranking(&current, 100, &cancel, fixture.compute(vec![]))
            .await
            .unwrap();
        let _: Vec<u32> = fixture
            .cache
            .ranking(&closed, 100, &cancel, fixture.compute(vec![]))
            .await
            .unwrap();

        assert_eq!(
            fixture.store.ttl("ranking:month:2024-03:100"),
            Some(Duration::from_secs(3600))
        );
        assert_eq!(
            fixture.store.ttl("ranking:month:2024-02:100"),
            Some(Duration::from_secs(7 * 24 * 3600))
        );
    }

    #[tokio::test]
    async fn read_failures_fail_open() {
        let fixture = Fixture::new("2024-03-10T12:00:00Z");
        let cancel = Cancellation::never();
        fixture.store.failing.store(true, Ordering::SeqCst);

        let rows = fixture
            .cache
            .archive(threshold(), &cancel, fixture.compute(store_rows()))
            .await
            .unwrap();

        assert_eq!(rows, store_rows());
        assert_eq!(fixture.calls(), 1);
    }

    #[tokio::test]
    async fn undecodable_payload_is_a_miss() {
        let fixture = Fixture::new("2024-03-10T12:00:00Z");
        let cancel = Cancellation::never();
        fixture.store.put_raw("k", b"not json");

        let value: u32 = fixture
            .cache
            .read_through("k", Duration::from_secs(30), &cancel, fixture.compute(7))
            .await
            .unwrap();

        assert_eq!(value, 7);
        assert_eq!(fixture.calls(), 1);
        assert_eq!(fixture.store.ttl("k"), Some(Duration::from_secs(30)));
    }

    #[tokio::test]
    async fn cancelled_requests_do_not_compute_or_write() {
        let fixture = Fixture::new("2024-03-10T12:00:00Z");
        let (handle, cancel) = Cancellation::new();
        handle.cancel();

        let result = fixture
            .cache
            .archive(threshold(), &cancel, fixture.compute(store_rows()))
            .await;

        assert_eq!(result, Err(TestError::Cancelled));
        assert_eq!(fixture.calls(), 0);
        assert_eq!(fixture.store.sets.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn archive_writes_past_bucket_before_today() {
        let fixture = Fixture::new("2024-03-10T12:00:00Z");
        fixture
            .cache
            .archive(threshold(), &Cancellation::never(), fixture.compute(store_rows()))
            .await
            .unwrap();

        assert_eq!(
            *fixture.store.written.lock().unwrap(),
            vec!["archive:5:past".to_string(), "archive:5:today".to_string()]
        );
    }

    #[tokio::test]
    async fn cancel_between_archive_writes_leaves_no_today_bucket() {
        let fixture = Fixture::new("2024-03-10T12:00:00Z");
        let (handle, cancel) = Cancellation::new();
        *fixture.store.cancel_after_set.lock().unwrap() = Some(handle);

        let result = fixture
            .cache
            .archive(threshold(), &cancel, fixture.compute(store_rows()))
            .await;

        assert_eq!(result, Err(TestError::Cancelled));
        assert!(fixture.store.ttl("archive:5:past").is_some());
        assert!(fixture.store.ttl("archive:5:today").is_none());

        // The lone past bucket is a partial miss; the next read recomputes.
        let rows = fixture
            .cache
            .archive(threshold(), &Cancellation::never(), fixture.compute(store_rows()))
            .await
            .unwrap();
        assert_eq!(rows, store_rows());
        assert_eq!(fixture.calls(), 2);
    }

    #[tokio::test]
    async fn invalidate_today_removes_only_the_volatile_bucket() {
        let fixture = Fixture::new("2024-03-10T12:00:00Z");
        let cancel = Cancellation::never();
        fixture
            .cache
            .archive(threshold(), &cancel, fixture.compute(store_rows()))
            .await
            .unwrap();

        fixture.cache.invalidate_today(threshold()).await;

        assert!(fixture.store.ttl("archive:5:today").is_none());
        assert!(fixture.store.ttl("archive:5:past").is_some());
    }
}
