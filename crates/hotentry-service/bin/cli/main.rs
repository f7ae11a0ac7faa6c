mod cli;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use hotentry_cache::{LayeredCacheStore, MokaCacheStore, RedisCacheStore, TimeBucketedCache, TtlPolicy};
use hotentry_core::{CacheStore, Cancellation, ListConfig, RawListQuery, SystemClock, TtlConfig};
use hotentry_service::ListService;
use hotentry_storage::PostgresStore;
use jiff::tz::TimeZone;
use serde_json::Value;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::{CacheBackendArg, Command, LogFormatArg, CLI};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::parse();
    init_tracing(config.log_format)?;

    let time_zone = TimeZone::get(&config.time_zone)
        .with_context(|| format!("unknown time zone '{}'", config.time_zone))?;
    let list_config = ListConfig::builder().time_zone(time_zone.clone()).build();
    let policy = TtlPolicy::new(TtlConfig::default(), time_zone);

    info!(
        cache_backend = %config.cache_backend,
        time_zone = %config.time_zone,
        "starting hotentry"
    );

    let store = PostgresStore::connect(&config.database_url, &list_config)
        .await
        .context("failed to connect to postgres")?;
    let store = Arc::new(store);

    let deadline = tokio::time::Instant::now() + Duration::from_millis(config.timeout_ms);
    let (handle, cancel) = Cancellation::new();
    let cancel = cancel.with_deadline(deadline);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling");
            handle.cancel();
        }
    });

    let output = match config.cache_backend {
        CacheBackendArg::Moka => {
            let cache = TimeBucketedCache::new(MokaCacheStore::new(), SystemClock, policy);
            run(config.command, store, cache, list_config, &cancel).await?
        }
        CacheBackendArg::Redis => {
            let redis = connect_redis(config.redis_url.as_deref(), &config.cache_prefix).await?;
            let cache = TimeBucketedCache::new(redis, SystemClock, policy);
            run(config.command, store, cache, list_config, &cancel).await?
        }
        CacheBackendArg::Layered => {
            let redis = connect_redis(config.redis_url.as_deref(), &config.cache_prefix).await?;
            let layered = LayeredCacheStore::new(MokaCacheStore::new(), redis);
            let cache = TimeBucketedCache::new(layered, SystemClock, policy);
            run(config.command, store, cache, list_config, &cancel).await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Logs go to stderr so stdout carries only the command's JSON.
fn init_tracing(format: LogFormatArg) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormatArg::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?,
        LogFormatArg::Text => registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .try_init()?,
    }
    Ok(())
}

async fn connect_redis(url: Option<&str>, prefix: &str) -> anyhow::Result<RedisCacheStore> {
    let url = url.context("redis url is required for the redis and layered cache backends")?;
    RedisCacheStore::connect(url, prefix)
        .await
        .context("failed to connect to redis")
}

async fn run<C: CacheStore>(
    command: Command,
    store: Arc<PostgresStore>,
    cache: TimeBucketedCache<C, SystemClock>,
    list_config: ListConfig,
    cancel: &Cancellation,
) -> anyhow::Result<Value> {
    let service = ListService::new(Arc::clone(&store), store, cache, list_config);

    let value = match command {
        Command::List { query, with_total } => {
            let raw = RawListQuery::from(query);
            if with_total {
                serde_json::to_value(service.list_with_total(&raw, cancel).await?)?
            } else {
                serde_json::to_value(service.list(&raw, cancel).await?)?
            }
        }
        Command::Count { query } => {
            let raw = RawListQuery::from(query);
            serde_json::to_value(service.count(&raw, cancel).await?)?
        }
        Command::Archive { threshold } => {
            serde_json::to_value(service.archive(threshold, cancel).await?)?
        }
        Command::Ranking {
            period,
            year,
            number,
        } => {
            let period = cli::ranking_period(period, year, number)?;
            serde_json::to_value(service.ranking(period, cancel).await?)?
        }
        Command::Tags { limit } => {
            serde_json::to_value(service.popular_tags(limit, cancel).await?)?
        }
        Command::Entry { id } => serde_json::to_value(service.entry(&id, cancel).await?)?,
    };
    Ok(value)
}
