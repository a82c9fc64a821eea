//! Cache snapshot and refresh notices handed to readers.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use pantry_core::{InventoryItem, SortKey, view};

/// Whether the cache reflects the store as of its last refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheState {
    /// Never refreshed, a mutation is in flight, or the last refresh failed.
    Stale,
    Fresh,
}

/// Immutable view of the cache at one generation.
///
/// Cloning is cheap; the item list is shared.
#[derive(Debug, Clone)]
pub struct CacheSnapshot {
    items: Arc<Vec<InventoryItem>>,
    generation: u64,
    refreshed_at: Option<DateTime<Utc>>,
    pub(crate) read_ticket: u64,
}

impl CacheSnapshot {
    pub(crate) fn empty() -> Self {
        Self {
            items: Arc::new(Vec::new()),
            generation: 0,
            refreshed_at: None,
            read_ticket: 0,
        }
    }

    pub(crate) fn next(&self, items: Vec<InventoryItem>, read_ticket: u64) -> Self {
        Self {
            items: Arc::new(items),
            generation: self.generation + 1,
            refreshed_at: Some(Utc::now()),
            read_ticket,
        }
    }

    /// Items in store listing order.
    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    /// Number of installed refreshes. Zero until the first refresh succeeds.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    /// Filtered and sorted copy of the items, for display.
    pub fn view(&self, search: &str, sort: SortKey) -> Vec<InventoryItem> {
        view(&self.items, search, sort)
    }
}

/// Broadcast after every installed refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshNotice {
    pub generation: u64,
    pub item_count: usize,
    pub refreshed_at: DateTime<Utc>,
}
