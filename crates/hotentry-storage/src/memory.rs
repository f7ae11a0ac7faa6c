use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering as AtomicOrdering};

use async_trait::async_trait;
use dashmap::DashMap;
use hotentry_core::query::{is_word_term, word_pattern};
use hotentry_core::store::Result;
use hotentry_core::tag::sort_taggings;
use hotentry_core::{
    normalize_tag_name, ArchiveCount, Entry, EntryId, EntryStore, ListConfig, ListQuery, Page,
    SortMode, StorageError, Tag, TagCount, TagStore, Tagging, Threshold,
};
use jiff::tz::TimeZone;
use regex::{Regex, RegexBuilder};

/// In-memory implementation of the entry and tag stores using DashMap.
///
/// Filtering, ordering and the two-stage keyword match follow the Postgres
/// store, including the candidate ceiling and the ASCII word boundaries of
/// [`word_pattern`], so tests written against one hold for the other.
#[derive(Debug)]
pub struct InMemoryStore {
    entries: DashMap<EntryId, Entry>,
    tags: DashMap<String, Tag>,
    taggings: DashMap<EntryId, Vec<Tagging>>,
    next_tag_id: AtomicI64,
    candidate_ceiling: usize,
    time_zone: TimeZone,
}

impl InMemoryStore {
    pub fn new(config: &ListConfig) -> Self {
        Self {
            entries: DashMap::new(),
            tags: DashMap::new(),
            taggings: DashMap::new(),
            next_tag_id: AtomicI64::new(1),
            candidate_ceiling: config.candidate_ceiling.max(1) as usize,
            time_zone: config.time_zone.clone(),
        }
    }

    /// Stores `entry`, replacing any entry with the same id.
    ///
    /// Taggings carried on the value are ignored; use [`Self::tag`].
    pub fn insert(&self, mut entry: Entry) -> EntryId {
        let id = entry.id;
        entry.taggings.clear();
        self.entries.insert(id, entry);
        id
    }

    /// Tags an entry, creating the tag on first use.
    ///
    /// Re-tagging with the same normalized name replaces the score.
    pub fn tag(&self, entry: &EntryId, name: &str, score: i32) -> Tag {
        let name = normalize_tag_name(name);
        let tag = self
            .tags
            .entry(name.clone())
            .or_insert_with(|| {
                Tag::new(self.next_tag_id.fetch_add(1, AtomicOrdering::Relaxed), &name)
            })
            .clone();

        let mut taggings = self.taggings.entry(*entry).or_default();
        taggings.retain(|tagging| tagging.tag_id != tag.id);
        taggings.push(Tagging {
            tag_id: tag.id,
            tag_name: tag.name.clone(),
            score,
        });
        tag
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn has_any_tag(&self, id: &EntryId, names: &[String]) -> bool {
        self.taggings.get(id).is_some_and(|taggings| {
            taggings
                .iter()
                .any(|tagging| names.contains(&tagging.tag_name))
        })
    }

    fn passes_filters(&self, entry: &Entry, query: &ListQuery) -> bool {
        if entry.count < query.min_count {
            return false;
        }
        if query.from.is_some_and(|from| entry.posted_at < from) {
            return false;
        }
        if query.to.is_some_and(|to| entry.posted_at >= to) {
            return false;
        }
        query.tags.is_empty() || self.has_any_tag(&entry.id, &query.tags)
    }

    /// Every entry matching the query, ordered, before pagination.
    fn matching(&self, query: &ListQuery) -> Result<Vec<Entry>> {
        let mut matched: Vec<Entry> = self
            .entries
            .iter()
            .filter(|entry| self.passes_filters(entry.value(), query))
            .map(|entry| entry.value().clone())
            .collect();

        if !query.has_keyword() {
            sort_entries(&mut matched, query.sort);
            return Ok(matched);
        }

        let terms = query.terms();
        let lowered: Vec<String> = terms.iter().map(|term| term.to_lowercase()).collect();
        matched.retain(|entry| {
            let text = entry.search_text.to_lowercase();
            lowered.iter().all(|term| text.contains(term.as_str()))
        });
        sort_entries(&mut matched, query.sort);
        matched.truncate(self.candidate_ceiling);

        let words = terms
            .iter()
            .filter(|term| is_word_term(term))
            .map(|term| word_regex(term))
            .collect::<Result<Vec<_>>>()?;
        matched.retain(|entry| words.iter().all(|word| word.is_match(&entry.search_text)));

        Ok(matched)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new(&ListConfig::default())
    }
}

fn word_regex(term: &str) -> Result<Regex> {
    RegexBuilder::new(&word_pattern(term))
        .case_insensitive(true)
        .build()
        .map_err(|e| StorageError::Query(format!("invalid keyword term '{term}': {e}")))
}

fn compare(a: &Entry, b: &Entry, sort: SortMode) -> Ordering {
    let recent = b.posted_at.cmp(&a.posted_at).then_with(|| b.id.cmp(&a.id));
    match sort {
        SortMode::Hot => b.count.cmp(&a.count).then(recent),
        SortMode::Recent => recent,
    }
}

fn sort_entries(entries: &mut [Entry], sort: SortMode) {
    entries.sort_by(|a, b| compare(a, b, sort));
}

fn paginate(entries: Vec<Entry>, query: &ListQuery) -> Vec<Entry> {
    entries
        .into_iter()
        .skip(query.offset.max(0) as usize)
        .take(query.limit.max(0) as usize)
        .collect()
}

#[async_trait]
impl EntryStore for InMemoryStore {
    async fn list(&self, query: &ListQuery) -> Result<Vec<Entry>> {
        Ok(paginate(self.matching(query)?, query))
    }

    async fn count(&self, query: &ListQuery) -> Result<u64> {
        Ok(self.matching(query)?.len() as u64)
    }

    async fn list_with_total(&self, query: &ListQuery) -> Result<Page> {
        let matched = self.matching(query)?;
        let total = matched.len() as u64;
        Ok(Page {
            entries: paginate(matched, query),
            total,
        })
    }

    async fn list_archive_counts(&self, threshold: Threshold) -> Result<Vec<ArchiveCount>> {
        let mut days: BTreeMap<jiff::civil::Date, u64> = BTreeMap::new();
        for entry in self.entries.iter() {
            if entry.count < threshold.get() {
                continue;
            }
            let date = entry.posted_at.to_zoned(self.time_zone.clone()).date();
            *days.entry(date).or_default() += 1;
        }

        Ok(days
            .into_iter()
            .rev()
            .map(|(date, count)| ArchiveCount { date, count })
            .collect())
    }

    async fn get_entry(&self, id: &EntryId) -> Result<Entry> {
        self.entries
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StorageError::NotFound(format!("entry {id}")))
    }

    async fn popular_tags(&self, limit: i64) -> Result<Vec<TagCount>> {
        let mut counts: HashMap<String, u64> = HashMap::new();
        for taggings in self.taggings.iter() {
            if !self.entries.contains_key(taggings.key()) {
                continue;
            }
            for tagging in taggings.value() {
                *counts.entry(tagging.tag_name.clone()).or_default() += 1;
            }
        }

        let mut tags: Vec<TagCount> = counts
            .into_iter()
            .map(|(name, count)| TagCount { name, count })
            .collect();
        tags.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
        tags.truncate(limit.max(0) as usize);
        Ok(tags)
    }
}

#[async_trait]
impl TagStore for InMemoryStore {
    async fn taggings_for(&self, ids: &[EntryId]) -> Result<HashMap<EntryId, Vec<Tagging>>> {
        let mut out = HashMap::new();
        for id in ids {
            if let Some(taggings) = self.taggings.get(id) {
                let mut taggings = taggings.value().clone();
                sort_taggings(&mut taggings);
                out.insert(*id, taggings);
            }
        }
        Ok(out)
    }
}
