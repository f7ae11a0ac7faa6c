use crate::config::ListConfig;
use crate::error::ValidationError;
use crate::tag::normalize_tag_name;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Result ordering for entry lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Newest first.
    #[default]
    Recent,
    /// Highest bookmark count first, newest first among ties.
    Hot,
}

impl SortMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Recent => "recent",
            SortMode::Hot => "hot",
        }
    }
}

impl Display for SortMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "recent" | "new" => Ok(SortMode::Recent),
            "hot" => Ok(SortMode::Hot),
            _ => Err(ValidationError::InvalidSort(s.to_string())),
        }
    }
}

/// A list request as received from a caller, before any defaults apply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawListQuery {
    pub tags: Vec<String>,
    pub min_count: i64,
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
    pub keyword: String,
    pub sort: String,
    pub limit: i64,
    pub offset: i64,
    /// Per-request replacement for the configured maximum limit.
    pub max_limit: Option<i64>,
}

/// A validated list request with every default applied.
///
/// Produce values with [`Normalizer::normalize`]; the query builder and the
/// cache key deriver assume its invariants hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    /// Normalized tag names. An entry matches if it carries any of them.
    pub tags: Vec<String>,
    pub min_count: i64,
    /// Inclusive lower bound on `posted_at`.
    pub from: Option<Timestamp>,
    /// Exclusive upper bound on `posted_at`.
    pub to: Option<Timestamp>,
    pub keyword: String,
    pub sort: SortMode,
    pub limit: i64,
    pub offset: i64,
    pub max_limit: Option<i64>,
}

impl ListQuery {
    /// Whitespace-separated keyword terms.
    pub fn terms(&self) -> Vec<&str> {
        self.keyword.split_whitespace().collect()
    }

    pub fn has_keyword(&self) -> bool {
        self.keyword.split_whitespace().next().is_some()
    }
}

/// Returns true for a term that must match as a whole word.
///
/// Only terms made purely of ASCII letters and digits get the word-boundary
/// check; anything else (CJK text, punctuation) relies on substring matching.
pub fn is_word_term(term: &str) -> bool {
    !term.is_empty() && term.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Case-insensitive pattern matching a word term between ASCII word
/// boundaries.
///
/// Only ASCII letters, digits and `_` count as word characters, so "Go" in
/// "Goで作る" still matches "go". The same text works as a Postgres ARE
/// (with `~*`) and as a `regex` pattern, keeping both stores in agreement
/// regardless of database locale. `term` must satisfy [`is_word_term`].
pub fn word_pattern(term: &str) -> String {
    format!("(^|[^0-9A-Za-z_]){term}($|[^0-9A-Za-z_])")
}

/// Turns [`RawListQuery`] values into [`ListQuery`] values.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    config: ListConfig,
}

impl Normalizer {
    pub fn new(config: ListConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ListConfig {
        &self.config
    }

    /// Validates and canonicalizes a raw query.
    ///
    /// Either every rule applies or an error is returned; there is no
    /// partially normalized result.
    pub fn normalize(&self, raw: &RawListQuery) -> Result<ListQuery, ValidationError> {
        let sort = SortMode::from_str(&raw.sort)?;

        let from = bound(raw.from);
        let to = bound(raw.to);
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(ValidationError::InvalidRange { from, to });
            }
        }

        let max_limit = raw.max_limit.filter(|max| *max > 0);
        let effective_max = max_limit.unwrap_or(self.config.max_limit);
        let limit = if raw.limit <= 0 {
            self.config.default_limit
        } else {
            raw.limit
        }
        .min(effective_max);

        let tags = raw
            .tags
            .iter()
            .map(|tag| normalize_tag_name(tag))
            .filter(|tag| !tag.is_empty())
            .collect();

        Ok(ListQuery {
            tags,
            min_count: raw.min_count.max(0),
            from,
            to,
            keyword: raw.keyword.trim().to_string(),
            sort,
            limit,
            offset: raw.offset.max(0),
            max_limit,
        })
    }
}

/// Unset and zero-value bounds mean "unbounded".
fn bound(value: Option<Timestamp>) -> Option<Timestamp> {
    value.filter(|ts| *ts != Timestamp::UNIX_EPOCH)
}
