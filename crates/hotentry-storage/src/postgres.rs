use std::collections::HashMap;

use async_trait::async_trait;
use hotentry_core::store::Result;
use hotentry_core::{
    ArchiveCount, Entry, EntryId, EntryStore, ListConfig, ListQuery, Page, StorageError, TagCount,
    TagStore, Tagging, Threshold,
};
use jiff::civil::Date;
use jiff::Timestamp;
use sqlx::postgres::PgArguments;
use sqlx::{Arguments, PgPool};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::plan::{self, Arg, PlanBuilder, PlanMode, QueryPlan};

/// Postgres implementation of the entry and tag stores.
///
/// Timestamps are stored as microseconds since the Unix epoch. Every
/// statement comes from [`crate::plan`] and carries its inputs as bound
/// parameters.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
    plans: PlanBuilder,
    /// IANA name of the zone that decides archive day boundaries.
    zone: String,
}

impl PostgresStore {
    /// Creates a store over an existing pool.
    ///
    /// The configured time zone must have an IANA name, since Postgres does
    /// the per-day grouping for archives.
    pub fn new(pool: PgPool, config: &ListConfig) -> Result<Self> {
        let zone = config.time_zone.iana_name().ok_or_else(|| {
            StorageError::Operation(
                "archive grouping needs a time zone with an IANA name".to_string(),
            )
        })?;
        Ok(Self {
            pool,
            plans: PlanBuilder::new(config.candidate_ceiling),
            zone: zone.to_string(),
        })
    }

    /// Opens a new pool and creates a store over it.
    pub async fn connect(database_url: &str, config: &ListConfig) -> Result<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Self::new(pool, config)
    }

    /// Creates the `entries`, `tags` and `taggings` tables if they are missing.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(include_str!("../ddl/postgres/entries.sql"))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_entries(&self, plan: QueryPlan) -> Result<Vec<Entry>> {
        let rows = sqlx::query_as_with::<_, EntryRow, _>(&plan.sql, arguments(&plan.args)?)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        rows.into_iter().map(Entry::try_from).collect()
    }

    async fn fetch_count(&self, plan: QueryPlan) -> Result<u64> {
        let count: i64 = sqlx::query_scalar_with(&plan.sql, arguments(&plan.args)?)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(count.max(0) as u64)
    }
}

pub(crate) fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::RowNotFound => StorageError::NotFound(message),
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::Database(db)
            if db
                .message()
                .contains("canceling statement due to statement timeout") =>
        {
            StorageError::Timeout(message)
        }
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_) => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

fn arguments(args: &[Arg]) -> Result<PgArguments> {
    let mut out = PgArguments::default();
    for arg in args {
        let added = match arg {
            Arg::Int(value) => out.add(*value),
            Arg::Text(value) => out.add(value.clone()),
            Arg::TextArray(values) => out.add(values.clone()),
            Arg::Uuid(value) => out.add(*value),
            Arg::UuidArray(values) => out.add(values.clone()),
        };
        added.map_err(|e| StorageError::Query(format!("failed to bind argument: {e}")))?;
    }
    Ok(out)
}

fn timestamp(column: &str, micros: i64) -> Result<Timestamp> {
    Timestamp::from_microsecond(micros).map_err(|e| {
        StorageError::InvalidData(format!("invalid {column} timestamp '{micros}': {e}"))
    })
}

#[derive(sqlx::FromRow)]
struct EntryRow {
    id: Uuid,
    title: String,
    url: String,
    excerpt: Option<String>,
    subject: Option<String>,
    search_text: String,
    count: i64,
    posted_at_us: i64,
    created_at_us: i64,
    updated_at_us: i64,
}

impl TryFrom<EntryRow> for Entry {
    type Error = StorageError;

    fn try_from(row: EntryRow) -> Result<Self> {
        Ok(Self {
            id: EntryId::from_uuid(row.id),
            title: row.title,
            url: row.url,
            posted_at: timestamp("posted_at", row.posted_at_us)?,
            count: row.count,
            excerpt: row.excerpt,
            subject: row.subject,
            search_text: row.search_text,
            created_at: timestamp("created_at", row.created_at_us)?,
            updated_at: timestamp("updated_at", row.updated_at_us)?,
            taggings: Vec::new(),
        })
    }
}

#[derive(sqlx::FromRow)]
struct PagedEntryRow {
    #[sqlx(flatten)]
    entry: EntryRow,
    total_count: i64,
}

#[derive(sqlx::FromRow)]
struct TaggingRow {
    entry_id: Uuid,
    tag_id: i64,
    tag_name: String,
    score: i32,
}

#[derive(sqlx::FromRow)]
struct ArchiveRow {
    day: String,
    count: i64,
}

#[derive(sqlx::FromRow)]
struct TagCountRow {
    name: String,
    count: i64,
}

#[async_trait]
impl EntryStore for PostgresStore {
    async fn list(&self, query: &ListQuery) -> Result<Vec<Entry>> {
        let plan = self.plans.list(query, PlanMode::Rows);
        trace!(sql = %plan.sql, args = plan.args.len(), "Listing entries");
        self.fetch_entries(plan).await
    }

    async fn count(&self, query: &ListQuery) -> Result<u64> {
        let plan = self.plans.list(query, PlanMode::Count);
        trace!(sql = %plan.sql, args = plan.args.len(), "Counting entries");
        self.fetch_count(plan).await
    }

    async fn list_with_total(&self, query: &ListQuery) -> Result<Page> {
        let plan = self.plans.list(query, PlanMode::RowsWithTotal);
        trace!(sql = %plan.sql, args = plan.args.len(), "Listing entries with total");

        let rows = sqlx::query_as_with::<_, PagedEntryRow, _>(&plan.sql, arguments(&plan.args)?)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        // The window count rides on the rows, so a page past the end needs
        // its own count.
        let total = match rows.first() {
            Some(row) => row.total_count.max(0) as u64,
            None if query.offset > 0 => {
                debug!(offset = query.offset, "Page past the end; counting separately");
                self.fetch_count(self.plans.list(query, PlanMode::Count))
                    .await?
            }
            None => 0,
        };

        let entries = rows
            .into_iter()
            .map(|row| Entry::try_from(row.entry))
            .collect::<Result<Vec<_>>>()?;
        Ok(Page { entries, total })
    }

    async fn list_archive_counts(&self, threshold: Threshold) -> Result<Vec<ArchiveCount>> {
        let plan = plan::archive_counts(threshold, &self.zone);
        trace!(threshold = %threshold, zone = %self.zone, "Counting entries per day");

        let rows = sqlx::query_as_with::<_, ArchiveRow, _>(&plan.sql, arguments(&plan.args)?)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        rows.into_iter()
            .map(|row| {
                let date = row.day.parse::<Date>().map_err(|e| {
                    StorageError::InvalidData(format!("invalid archive day '{}': {e}", row.day))
                })?;
                Ok(ArchiveCount {
                    date,
                    count: row.count.max(0) as u64,
                })
            })
            .collect()
    }

    async fn get_entry(&self, id: &EntryId) -> Result<Entry> {
        let plan = plan::entry_by_id(*id.as_uuid());
        trace!(id = %id, "Fetching entry");

        let row = sqlx::query_as_with::<_, EntryRow, _>(&plan.sql, arguments(&plan.args)?)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        match row {
            Some(row) => Entry::try_from(row),
            None => Err(StorageError::NotFound(format!("entry {id}"))),
        }
    }

    async fn popular_tags(&self, limit: i64) -> Result<Vec<TagCount>> {
        let plan = plan::popular_tags(limit.max(0));
        trace!(limit, "Fetching popular tags");

        let rows = sqlx::query_as_with::<_, TagCountRow, _>(&plan.sql, arguments(&plan.args)?)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|row| TagCount {
                name: row.name,
                count: row.count.max(0) as u64,
            })
            .collect())
    }
}

#[async_trait]
impl TagStore for PostgresStore {
    async fn taggings_for(&self, ids: &[EntryId]) -> Result<HashMap<EntryId, Vec<Tagging>>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let uuids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let plan = plan::taggings(&uuids);
        trace!(entries = ids.len(), "Loading taggings");

        let rows = sqlx::query_as_with::<_, TaggingRow, _>(&plan.sql, arguments(&plan.args)?)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        // Rows arrive grouped by entry and already ordered by score.
        let mut taggings: HashMap<EntryId, Vec<Tagging>> = HashMap::new();
        for row in rows {
            taggings
                .entry(EntryId::from_uuid(row.entry_id))
                .or_default()
                .push(Tagging {
                    tag_id: row.tag_id,
                    tag_name: row.tag_name,
                    score: row.score,
                });
        }
        Ok(taggings)
    }
}
