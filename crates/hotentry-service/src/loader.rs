use std::sync::Arc;

use hotentry_core::store::Result;
use hotentry_core::tag::sort_taggings;
use hotentry_core::{Entry, EntryId, TagStore};
use tracing::trace;

/// Attaches taggings to a batch of entries in one store round trip.
#[derive(Debug)]
pub struct TagLoader<T> {
    store: Arc<T>,
}

impl<T> Clone for TagLoader<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<T: TagStore> TagLoader<T> {
    pub fn new(store: Arc<T>) -> Self {
        Self { store }
    }

    /// Replaces each entry's taggings with the stored ones, highest score
    /// first. Other fields are left untouched.
    ///
    /// A failed fetch leaves the whole batch unchanged.
    pub async fn enrich(&self, entries: &mut [Entry]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let ids: Vec<EntryId> = entries.iter().map(|entry| entry.id).collect();
        trace!(entries = ids.len(), "Loading taggings for batch");
        let mut taggings = self.store.taggings_for(&ids).await?;

        for entry in entries.iter_mut() {
            let mut attached = taggings.remove(&entry.id).unwrap_or_default();
            sort_taggings(&mut attached);
            entry.taggings = attached;
        }
        Ok(())
    }
}
