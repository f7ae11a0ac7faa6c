//! Cache key derivation.
//!
//! List keys hash a canonical rendering of a normalized [`ListQuery`], so two
//! requests that normalize to the same query share a key no matter how their
//! tags were ordered, cased or repeated. Aggregate keys are readable as-is.

use hotentry_core::{ListQuery, RankingPeriod, Threshold};
use jiff::Timestamp;
use sha2::{Digest, Sha256};

/// Which result shape a list key caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListMode {
    Rows,
    Count,
    Page,
}

impl ListMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListMode::Rows => "rows",
            ListMode::Count => "count",
            ListMode::Page => "page",
        }
    }
}

pub fn list_key(mode: ListMode, query: &ListQuery) -> String {
    let digest = Sha256::digest(canonical_text(mode, query).as_bytes());
    format!("list:{}:{}", mode.as_str(), hex::encode(digest))
}

pub fn archive_today_key(threshold: Threshold) -> String {
    format!("archive:{threshold}:today")
}

pub fn archive_past_key(threshold: Threshold) -> String {
    format!("archive:{threshold}:past")
}

/// `ranking:<kind>:<period>:<limit>`, e.g. `ranking:week:2020-W53:100`.
pub fn ranking_key(period: &RankingPeriod, limit: i64) -> String {
    format!("ranking:{}:{period}:{limit}", period.kind().as_str())
}

pub fn popular_tags_key(limit: i64) -> String {
    format!("tags:popular:{limit}")
}

fn canonical_text(mode: ListMode, query: &ListQuery) -> String {
    let mut tags: Vec<&str> = query.tags.iter().map(String::as_str).collect();
    tags.sort_unstable();
    tags.dedup();

    let max_limit = query
        .max_limit
        .map_or_else(|| "-".to_string(), |max| max.to_string());

    [
        format!("mode={}", quoted(mode.as_str())),
        format!("sort={}", quoted(query.sort.as_str())),
        format!("min_count={}", query.min_count),
        format!("offset={}", query.offset),
        format!("limit={}", query.limit),
        format!("tags={}", serde_json::Value::from(tags)),
        format!("from={}", bound(query.from)),
        format!("to={}", bound(query.to)),
        format!("keyword={}", quoted(&query.terms().join(" "))),
        format!("max_limit={max_limit}"),
    ]
    .join("\n")
}

fn quoted(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

fn bound(value: Option<Timestamp>) -> String {
    match value {
        Some(ts) => format!("{ts:.6}"),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotentry_core::{Normalizer, RawListQuery};

    fn key(raw: RawListQuery) -> String {
        let query = Normalizer::default().normalize(&raw).unwrap();
        list_key(ListMode::Rows, &query)
    }

    fn base() -> RawListQuery {
        RawListQuery {
            tags: vec!["rust".into(), "go".into()],
            min_count: 5,
            from: Some(Timestamp::from_second(1_700_000_000).unwrap()),
            keyword: "async".into(),
            sort: "hot".into(),
            limit: 10,
            ..Default::default()
        }
    }

    #[test]
    fn keys_are_stable_and_hex_encoded() {
        let first = key(base());
        assert_eq!(first, key(base()));

        let digest = first.strip_prefix("list:rows:").unwrap();
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn tag_order_case_and_duplicates_do_not_matter() {
        let shuffled = RawListQuery {
            tags: vec!["GO".into(), " rust".into(), "go".into()],
            ..base()
        };
        assert_eq!(key(base()), key(shuffled));
    }

    #[test]
    fn equivalent_raw_inputs_share_a_key() {
        let spelled_out = RawListQuery {
            sort: " HOT ".into(),
            keyword: "  async ".into(),
            from: Some(Timestamp::from_second(1_700_000_000).unwrap()),
            to: Some(Timestamp::UNIX_EPOCH),
            ..base()
        };
        assert_eq!(key(base()), key(spelled_out));
    }

    #[test]
    fn every_field_changes_the_key() {
        let original = key(base());
        let variants = [
            RawListQuery {
                tags: vec!["rust".into()],
                ..base()
            },
            RawListQuery {
                min_count: 6,
                ..base()
            },
            RawListQuery {
                from: Some(Timestamp::from_second(1_700_000_001).unwrap()),
                ..base()
            },
            RawListQuery {
                to: Some(Timestamp::from_second(1_800_000_000).unwrap()),
                ..base()
            },
            RawListQuery {
                keyword: "Async".into(),
                ..base()
            },
            RawListQuery {
                sort: "recent".into(),
                ..base()
            },
            RawListQuery {
                limit: 11,
                ..base()
            },
            RawListQuery {
                offset: 1,
                ..base()
            },
            RawListQuery {
                max_limit: Some(500),
                ..base()
            },
        ];

        for variant in variants {
            assert_ne!(original, key(variant.clone()), "{variant:?}");
        }
    }

    #[test]
    fn keyword_spacing_does_not_matter() {
        let single = RawListQuery {
            keyword: "go rust".into(),
            ..base()
        };
        let padded = RawListQuery {
            keyword: "go   rust".into(),
            ..base()
        };
        let tabbed = RawListQuery {
            keyword: "go\trust".into(),
            ..base()
        };
        assert_eq!(key(single.clone()), key(padded));
        assert_eq!(key(single), key(tabbed));
    }

    #[test]
    fn tags_containing_commas_stay_distinct() {
        let joined = RawListQuery {
            tags: vec!["a,b".into()],
            ..base()
        };
        let split = RawListQuery {
            tags: vec!["a".into(), "b".into()],
            ..base()
        };
        assert_ne!(key(joined), key(split));
    }

    #[test]
    fn mode_is_part_of_the_key() {
        let query = Normalizer::default().normalize(&base()).unwrap();
        assert_ne!(
            list_key(ListMode::Rows, &query),
            list_key(ListMode::Count, &query)
        );
        assert!(list_key(ListMode::Page, &query).starts_with("list:page:"));
    }

    #[test]
    fn aggregate_keys() {
        let threshold = Threshold::new(50).unwrap();
        assert_eq!(archive_today_key(threshold), "archive:50:today");
        assert_eq!(archive_past_key(threshold), "archive:50:past");
        assert_eq!(popular_tags_key(30), "tags:popular:30");

        let year = RankingPeriod::year(2024).unwrap();
        assert_eq!(ranking_key(&year, 100), "ranking:year:2024:100");
        let month = RankingPeriod::month(2024, 3).unwrap();
        assert_eq!(ranking_key(&month, 100), "ranking:month:2024-03:100");
        let week = RankingPeriod::week(2020, 53).unwrap();
        assert_eq!(ranking_key(&week, 10), "ranking:week:2020-W53:10");
    }
}
