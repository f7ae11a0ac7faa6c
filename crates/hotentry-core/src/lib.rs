//! Core types and traits for the hotentry listing backend.
//!
//! This crate provides the domain model, query normalization, configuration
//! and the store/cache contracts shared by the storage, cache and service
//! crates.

pub mod aggregate;
pub mod cache;
pub mod cancel;
pub mod clock;
pub mod config;
pub mod entry;
pub mod error;
pub mod query;
pub mod store;
pub mod tag;

pub use aggregate::{ArchiveCount, PeriodKind, RankingPeriod, Threshold, ALLOWED_THRESHOLDS};
pub use cache::CacheStore;
pub use cancel::{CancelHandle, Cancellation};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ListConfig, TtlConfig};
pub use entry::{Entry, EntryId, NewEntry, Page};
pub use error::{CacheError, Cancelled, StorageError, ValidationError};
pub use query::{ListQuery, Normalizer, RawListQuery, SortMode};
pub use store::{EntryStore, TagStore};
pub use tag::{normalize_tag_name, Tag, TagCount, Tagging};
