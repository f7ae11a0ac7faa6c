use clap::{Args, Parser, Subcommand, ValueEnum};
use hotentry_core::{EntryId, PeriodKind, RankingPeriod, RawListQuery, ValidationError};
use jiff::Timestamp;
use std::fmt::{Display, Formatter};

pub const DATABASE_URL_ENV: &str = "HOTENTRY_DATABASE_URL";
pub const REDIS_URL_ENV: &str = "HOTENTRY_REDIS_URL";
pub const CACHE_BACKEND_ENV: &str = "HOTENTRY_CACHE_BACKEND";
pub const CACHE_PREFIX_ENV: &str = "HOTENTRY_CACHE_PREFIX";
pub const TIME_ZONE_ENV: &str = "HOTENTRY_TIME_ZONE";
pub const LOG_FORMAT_ENV: &str = "HOTENTRY_LOG_FORMAT";
pub const TIMEOUT_MS_ENV: &str = "HOTENTRY_TIMEOUT_MS";

pub const DEFAULT_TIME_ZONE: &str = "UTC";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CacheBackendArg {
    #[value(name = "moka")]
    Moka,
    #[value(name = "redis")]
    Redis,
    #[value(name = "layered")]
    Layered,
}

impl Display for CacheBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheBackendArg::Moka => write!(f, "moka"),
            CacheBackendArg::Redis => write!(f, "redis"),
            CacheBackendArg::Layered => write!(f, "layered"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    #[value(name = "text")]
    Text,
    #[value(name = "json")]
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PeriodArg {
    #[value(name = "year")]
    Year,
    #[value(name = "month")]
    Month,
    #[value(name = "week")]
    Week,
}

#[derive(Debug, Parser)]
#[command(name = "hotentry", about = "Query the hotentry listing backend")]
pub struct CLI {
    #[arg(long, env = DATABASE_URL_ENV)]
    pub database_url: String,

    #[arg(
        long = "cache",
        env = CACHE_BACKEND_ENV,
        value_enum,
        default_value_t = CacheBackendArg::Moka
    )]
    pub cache_backend: CacheBackendArg,

    #[arg(
        long,
        env = REDIS_URL_ENV,
        required_if_eq_any([("cache_backend", "redis"), ("cache_backend", "layered")])
    )]
    pub redis_url: Option<String>,

    #[arg(
        long,
        env = CACHE_PREFIX_ENV,
        default_value = hotentry_cache::redis::DEFAULT_KEY_PREFIX
    )]
    pub cache_prefix: String,

    /// IANA time zone deciding where days, weeks, months and years start.
    #[arg(long, env = TIME_ZONE_ENV, default_value = DEFAULT_TIME_ZONE)]
    pub time_zone: String,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormatArg::Text)]
    pub log_format: LogFormatArg,

    /// Deadline for the whole command, in milliseconds.
    #[arg(long, env = TIMEOUT_MS_ENV, default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List entries.
    List {
        #[command(flatten)]
        query: QueryArgs,
        /// Also report the size of the full filtered set.
        #[arg(long)]
        with_total: bool,
    },
    /// Count entries matching the filters.
    Count {
        #[command(flatten)]
        query: QueryArgs,
    },
    /// Per-day counts of entries at or above a bookmark threshold.
    Archive {
        #[arg(long, default_value_t = 5)]
        threshold: i64,
    },
    /// Hottest entries of a year, month or ISO week.
    Ranking {
        #[arg(value_enum)]
        period: PeriodArg,
        year: i16,
        /// Month (1-12) or ISO week (1-53); required unless the period is a year.
        number: Option<i8>,
    },
    /// Most used tags.
    Tags {
        #[arg(long, default_value_t = 0)]
        limit: i64,
    },
    /// A single entry by id.
    Entry { id: EntryId },
}

#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Require this tag; repeat for several.
    #[arg(long = "tag")]
    pub tags: Vec<String>,
    #[arg(long, default_value_t = 0)]
    pub min_count: i64,
    #[arg(long)]
    pub from: Option<Timestamp>,
    #[arg(long)]
    pub to: Option<Timestamp>,
    #[arg(long, default_value = "")]
    pub keyword: String,
    /// "recent" or "hot".
    #[arg(long, default_value = "")]
    pub sort: String,
    #[arg(long, default_value_t = 0)]
    pub limit: i64,
    #[arg(long, default_value_t = 0)]
    pub offset: i64,
}

impl From<QueryArgs> for RawListQuery {
    fn from(args: QueryArgs) -> Self {
        RawListQuery {
            tags: args.tags,
            min_count: args.min_count,
            from: args.from,
            to: args.to,
            keyword: args.keyword,
            sort: args.sort,
            limit: args.limit,
            offset: args.offset,
            max_limit: None,
        }
    }
}

pub fn ranking_period(
    period: PeriodArg,
    year: i16,
    number: Option<i8>,
) -> Result<RankingPeriod, ValidationError> {
    let kind = match period {
        PeriodArg::Year => PeriodKind::Year,
        PeriodArg::Month => PeriodKind::Month,
        PeriodArg::Week => PeriodKind::Week,
    };
    match (kind, number) {
        (PeriodKind::Year, _) => RankingPeriod::year(year),
        (PeriodKind::Month, Some(month)) => RankingPeriod::month(year, month),
        (PeriodKind::Week, Some(week)) => RankingPeriod::week(year, week),
        (kind, None) => Err(ValidationError::InvalidPeriod(format!(
            "a {} ranking needs a number after the year",
            kind.as_str()
        ))),
    }
}
