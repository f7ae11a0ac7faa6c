use crate::aggregate::{ArchiveCount, Threshold};
use crate::entry::{Entry, EntryId, Page};
use crate::error::StorageError;
use crate::query::ListQuery;
use crate::tag::{TagCount, Tagging};
use async_trait::async_trait;
use std::collections::HashMap;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Read access to stored entries.
///
/// Implementations return entries without their taggings; the tag loader
/// attaches those in a separate batch round trip.
#[async_trait]
pub trait EntryStore: Send + Sync + 'static {
    /// Entries matching the query, ordered by its sort mode and paginated.
    async fn list(&self, query: &ListQuery) -> Result<Vec<Entry>>;

    /// Number of entries matching the query's filters, ignoring pagination.
    async fn count(&self, query: &ListQuery) -> Result<u64>;

    /// One page of entries together with the size of the full filtered set.
    async fn list_with_total(&self, query: &ListQuery) -> Result<Page>;

    /// Per-day entry counts at or above `threshold`, newest day first.
    async fn list_archive_counts(&self, threshold: Threshold) -> Result<Vec<ArchiveCount>>;

    /// A single entry. Returns `Err(NotFound)` when no entry has the id.
    async fn get_entry(&self, id: &EntryId) -> Result<Entry>;

    /// The most used tags, most used first.
    async fn popular_tags(&self, limit: i64) -> Result<Vec<TagCount>>;
}

/// Read access to entry/tag associations.
#[async_trait]
pub trait TagStore: Send + Sync + 'static {
    /// Taggings of every listed entry, fetched in one round trip.
    ///
    /// Entries without taggings are absent from the map.
    async fn taggings_for(&self, ids: &[EntryId]) -> Result<HashMap<EntryId, Vec<Tagging>>>;
}
