use jiff::tz::TimeZone;
use std::time::Duration;
use typed_builder::TypedBuilder;

pub const DEFAULT_LIMIT: i64 = 20;
pub const DEFAULT_MAX_LIMIT: i64 = 100;
pub const DEFAULT_CANDIDATE_CEILING: i64 = 2000;
pub const DEFAULT_RANKING_LIMIT: i64 = 100;

/// Limits and calendar settings for list queries.
#[derive(Debug, Clone, TypedBuilder)]
pub struct ListConfig {
    /// Applied when a request asks for a non-positive limit.
    #[builder(default = DEFAULT_LIMIT)]
    pub default_limit: i64,
    /// Upper bound on the limit unless a request carries its own override.
    #[builder(default = DEFAULT_MAX_LIMIT)]
    pub max_limit: i64,
    /// Most rows the keyword prefilter hands to the word-boundary refinement.
    ///
    /// Rows beyond the ceiling are dropped even if they would match; this is
    /// an approximation accepted to keep keyword searches bounded.
    #[builder(default = DEFAULT_CANDIDATE_CEILING)]
    pub candidate_ceiling: i64,
    /// Number of entries in a yearly/monthly/weekly ranking.
    #[builder(default = DEFAULT_RANKING_LIMIT)]
    pub ranking_limit: i64,
    /// Zone that decides where a day, week, month or year starts.
    #[builder(default = TimeZone::UTC)]
    pub time_zone: TimeZone,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// TTLs for cached results, split by whether the period is still open.
#[derive(Debug, Clone, TypedBuilder)]
pub struct TtlConfig {
    #[builder(default = Duration::from_secs(10 * 60))]
    pub current_day: Duration,
    #[builder(default = Duration::from_secs(24 * 60 * 60))]
    pub past_day: Duration,
    #[builder(default = Duration::from_secs(30 * 60))]
    pub current_week: Duration,
    #[builder(default = Duration::from_secs(3 * 24 * 60 * 60))]
    pub past_week: Duration,
    #[builder(default = Duration::from_secs(60 * 60))]
    pub current_month: Duration,
    #[builder(default = Duration::from_secs(7 * 24 * 60 * 60))]
    pub past_month: Duration,
    #[builder(default = Duration::from_secs(60 * 60))]
    pub current_year: Duration,
    #[builder(default = Duration::from_secs(7 * 24 * 60 * 60))]
    pub past_year: Duration,
    /// Ad-hoc list, count and page queries.
    #[builder(default = Duration::from_secs(5 * 60))]
    pub list: Duration,
    #[builder(default = Duration::from_secs(60 * 60))]
    pub tags: Duration,
}

impl Default for TtlConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_constants() {
        let config = ListConfig::default();
        assert_eq!(config.default_limit, 20);
        assert_eq!(config.max_limit, 100);
        assert_eq!(config.candidate_ceiling, 2000);
        assert_eq!(config.time_zone.iana_name(), Some("UTC"));
    }

    #[test]
    fn current_ttls_are_shorter_than_past_ttls() {
        let ttl = TtlConfig::default();
        assert!(ttl.current_day < ttl.past_day);
        assert!(ttl.current_week < ttl.past_week);
        assert!(ttl.current_month < ttl.past_month);
        assert!(ttl.current_year < ttl.past_year);
    }

    #[test]
    fn builder_overrides_single_field() {
        let config = ListConfig::builder().max_limit(500).build();
        assert_eq!(config.max_limit, 500);
        assert_eq!(config.default_limit, DEFAULT_LIMIT);
    }
}
