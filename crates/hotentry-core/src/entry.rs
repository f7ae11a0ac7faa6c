use crate::error::ValidationError;
use crate::tag::Tagging;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use uuid::Uuid;

/// Opaque unique identifier of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(Uuid);

impl EntryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for EntryId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A stored, bookmarked URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub title: String,
    pub url: String,
    pub posted_at: Timestamp,
    /// Bookmark count, never negative.
    pub count: i64,
    pub excerpt: Option<String>,
    pub subject: Option<String>,
    /// Title, excerpt and URL joined by spaces; keyword search runs over this.
    pub search_text: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(default)]
    pub taggings: Vec<Tagging>,
}

/// Fields needed to create an [`Entry`].
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub title: String,
    pub url: String,
    pub posted_at: Timestamp,
    pub count: i64,
    pub excerpt: Option<String>,
    pub subject: Option<String>,
}

impl Entry {
    /// Builds an entry with a fresh id, checking the title/url/count invariants
    /// and deriving the search text.
    pub fn new(new: NewEntry) -> Result<Self, ValidationError> {
        let title = new.title.trim().to_string();
        let url = new.url.trim().to_string();

        if title.is_empty() {
            return Err(ValidationError::InvalidEntry("title is required".into()));
        }
        if url.is_empty() {
            return Err(ValidationError::InvalidEntry("url is required".into()));
        }
        if new.count < 0 {
            return Err(ValidationError::InvalidEntry(format!(
                "count must not be negative, got {}",
                new.count
            )));
        }

        let search_text = compose_search_text(&title, new.excerpt.as_deref(), &url);

        Ok(Self {
            id: EntryId::new(),
            title,
            url,
            posted_at: new.posted_at,
            count: new.count,
            excerpt: new.excerpt,
            subject: new.subject,
            search_text,
            created_at: new.posted_at,
            updated_at: new.posted_at,
            taggings: Vec::new(),
        })
    }
}

/// Joins the searchable fields of an entry.
pub fn compose_search_text(title: &str, excerpt: Option<&str>, url: &str) -> String {
    [Some(title), excerpt, Some(url)]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// One page of entries plus the size of the full filtered set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub entries: Vec<Entry>,
    pub total: u64,
}
