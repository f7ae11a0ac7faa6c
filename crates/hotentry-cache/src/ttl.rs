use std::time::Duration;

use hotentry_core::{PeriodKind, RankingPeriod, TtlConfig};
use jiff::civil::Date;
use jiff::tz::TimeZone;
use jiff::Timestamp;

/// Whether a time bucket can still change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// The period contains "now" (or lies ahead of it).
    Current,
    /// The period is closed; its data is immutable.
    Past,
}

/// Picks TTLs from [`TtlConfig`] based on where a bucket sits relative to
/// the clock in the configured zone.
#[derive(Debug, Clone)]
pub struct TtlPolicy {
    config: TtlConfig,
    time_zone: TimeZone,
}

impl TtlPolicy {
    pub fn new(config: TtlConfig, time_zone: TimeZone) -> Self {
        Self { config, time_zone }
    }

    pub fn time_zone(&self) -> &TimeZone {
        &self.time_zone
    }

    /// The calendar day containing `now`.
    pub fn today(&self, now: Timestamp) -> Date {
        now.to_zoned(self.time_zone.clone()).date()
    }

    pub fn day_freshness(&self, date: Date, now: Timestamp) -> Freshness {
        if date >= self.today(now) {
            Freshness::Current
        } else {
            Freshness::Past
        }
    }

    pub fn period_freshness(&self, period: &RankingPeriod, now: Timestamp) -> Freshness {
        if self.today(now) < period.end() {
            Freshness::Current
        } else {
            Freshness::Past
        }
    }

    pub fn day_ttl(&self, freshness: Freshness) -> Duration {
        match freshness {
            Freshness::Current => self.config.current_day,
            Freshness::Past => self.config.past_day,
        }
    }

    pub fn period_ttl(&self, period: &RankingPeriod, now: Timestamp) -> Duration {
        let freshness = self.period_freshness(period, now);
        let config = &self.config;
        match (period.kind(), freshness) {
            (PeriodKind::Week, Freshness::Current) => config.current_week,
            (PeriodKind::Week, Freshness::Past) => config.past_week,
            (PeriodKind::Month, Freshness::Current) => config.current_month,
            (PeriodKind::Month, Freshness::Past) => config.past_month,
            (PeriodKind::Year, Freshness::Current) => config.current_year,
            (PeriodKind::Year, Freshness::Past) => config.past_year,
        }
    }

    pub fn list_ttl(&self) -> Duration {
        self.config.list
    }

    pub fn tags_ttl(&self) -> Duration {
        self.config.tags
    }
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self::new(TtlConfig::default(), TimeZone::UTC)
    }
}
