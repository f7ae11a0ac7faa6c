use std::sync::Arc;

use hotentry_cache::{ListMode, TimeBucketedCache};
use hotentry_core::{
    ArchiveCount, CacheStore, Cancellation, Clock, Entry, EntryId, EntryStore, ListConfig,
    ListQuery, Normalizer, Page, RankingPeriod, RawListQuery, TagCount, TagStore, Threshold,
};
use tracing::{debug, trace};

use crate::error::Result;
use crate::loader::TagLoader;

/// Read side of hotentry: listings, counts, archives, rankings and tags.
///
/// Every read goes through the time-bucketed cache first; on a miss the
/// entry store is queried and the result is enriched with taggings before it
/// is cached. Cache failures degrade to store reads and never surface.
pub struct ListService<E, T, C, K> {
    entries: Arc<E>,
    tags: TagLoader<T>,
    cache: TimeBucketedCache<C, K>,
    normalizer: Normalizer,
}

impl<E, T, C, K> ListService<E, T, C, K>
where
    E: EntryStore,
    T: TagStore,
    C: CacheStore,
    K: Clock,
{
    pub fn new(
        entries: Arc<E>,
        tags: Arc<T>,
        cache: TimeBucketedCache<C, K>,
        config: ListConfig,
    ) -> Self {
        Self {
            entries,
            tags: TagLoader::new(tags),
            cache,
            normalizer: Normalizer::new(config),
        }
    }

    pub fn config(&self) -> &ListConfig {
        self.normalizer.config()
    }

    pub fn cache(&self) -> &TimeBucketedCache<C, K> {
        &self.cache
    }

    /// Entries matching `raw`, with taggings attached.
    pub async fn list(&self, raw: &RawListQuery, cancel: &Cancellation) -> Result<Vec<Entry>> {
        let query = self.normalizer.normalize(raw)?;
        trace!(sort = query.sort.as_str(), limit = query.limit, "Listing entries");

        self.cache
            .list(ListMode::Rows, &query, cancel, || {
                self.load_entries(&query, cancel)
            })
            .await
    }

    /// Number of entries matching `raw`, ignoring its pagination.
    pub async fn count(&self, raw: &RawListQuery, cancel: &Cancellation) -> Result<u64> {
        let query = self.normalizer.normalize(raw)?;

        self.cache
            .list(ListMode::Count, &query, cancel, || {
                self.load_count(&query, cancel)
            })
            .await
    }

    /// One page of entries, with taggings, plus the size of the filtered set.
    pub async fn list_with_total(
        &self,
        raw: &RawListQuery,
        cancel: &Cancellation,
    ) -> Result<Page> {
        let query = self.normalizer.normalize(raw)?;

        self.cache
            .list(ListMode::Page, &query, cancel, || {
                self.load_page(&query, cancel)
            })
            .await
    }

    /// Per-day counts of entries with at least `threshold` bookmarks, newest
    /// day first.
    pub async fn archive(&self, threshold: i64, cancel: &Cancellation) -> Result<Vec<ArchiveCount>> {
        let threshold = Threshold::new(threshold)?;

        self.cache
            .archive(threshold, cancel, || self.load_archive(threshold, cancel))
            .await
    }

    /// The hottest entries posted within `period`.
    pub async fn ranking(
        &self,
        period: RankingPeriod,
        cancel: &Cancellation,
    ) -> Result<Vec<Entry>> {
        let config = self.normalizer.config();
        let (from, to) = period.range(&config.time_zone)?;
        let limit = config.ranking_limit;
        let query = self.normalizer.normalize(&RawListQuery {
            from: Some(from),
            to: Some(to),
            sort: "hot".to_string(),
            limit,
            max_limit: Some(limit),
            ..Default::default()
        })?;
        debug!(period = %period, kind = period.kind().as_str(), "Loading ranking");

        self.cache
            .ranking(&period, limit, cancel, || self.load_entries(&query, cancel))
            .await
    }

    /// The most used tags. Non-positive limits fall back to the default
    /// limit; larger ones are capped at the configured maximum.
    pub async fn popular_tags(&self, limit: i64, cancel: &Cancellation) -> Result<Vec<TagCount>> {
        let config = self.normalizer.config();
        let limit = if limit <= 0 {
            config.default_limit
        } else {
            limit.min(config.max_limit)
        };

        self.cache
            .popular_tags(limit, cancel, || self.load_popular_tags(limit, cancel))
            .await
    }

    /// A single entry with its taggings. Not cached.
    pub async fn entry(&self, id: &EntryId, cancel: &Cancellation) -> Result<Entry> {
        let entry = cancel.run(self.entries.get_entry(id)).await??;
        let mut batch = [entry];
        cancel.run(self.tags.enrich(&mut batch)).await??;
        let [entry] = batch;
        Ok(entry)
    }

    /// Forces the next archive read for `threshold` to recompute today.
    pub async fn invalidate_today(&self, threshold: i64) -> Result<()> {
        let threshold = Threshold::new(threshold)?;
        self.cache.invalidate_today(threshold).await;
        Ok(())
    }

    async fn load_entries(&self, query: &ListQuery, cancel: &Cancellation) -> Result<Vec<Entry>> {
        let mut entries = cancel.run(self.entries.list(query)).await??;
        cancel.run(self.tags.enrich(&mut entries)).await??;
        Ok(entries)
    }

    async fn load_count(&self, query: &ListQuery, cancel: &Cancellation) -> Result<u64> {
        Ok(cancel.run(self.entries.count(query)).await??)
    }

    async fn load_page(&self, query: &ListQuery, cancel: &Cancellation) -> Result<Page> {
        let mut page = cancel.run(self.entries.list_with_total(query)).await??;
        cancel.run(self.tags.enrich(&mut page.entries)).await??;
        Ok(page)
    }

    async fn load_archive(
        &self,
        threshold: Threshold,
        cancel: &Cancellation,
    ) -> Result<Vec<ArchiveCount>> {
        Ok(cancel
            .run(self.entries.list_archive_counts(threshold))
            .await??)
    }

    async fn load_popular_tags(&self, limit: i64, cancel: &Cancellation) -> Result<Vec<TagCount>> {
        Ok(cancel.run(self.entries.popular_tags(limit)).await??)
    }
}
