use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pantry_core::{InventoryItem, SortKey};
use pantry_sync::{CacheSnapshot, CacheState};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub sort: Option<String>,
}

impl ListQuery {
    pub fn sort_key(&self) -> SortKey {
        self.sort.as_deref().map(SortKey::from_param).unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub name: String,
    pub expiration: String,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub name: String,
    pub display_name: String,
    pub quantity: i64,
    pub expiration: Option<String>,
}

impl From<&InventoryItem> for ItemResponse {
    fn from(item: &InventoryItem) -> Self {
        Self {
            name: item.name().as_str().to_string(),
            display_name: item.display_name(),
            quantity: item.quantity(),
            expiration: item.expiration().map(|e| e.as_str().to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InventoryResponse {
    pub state: CacheState,
    pub generation: u64,
    pub refreshed_at: Option<DateTime<Utc>>,
    pub sort: &'static str,
    pub items: Vec<ItemResponse>,
}

impl InventoryResponse {
    pub fn from_snapshot(snapshot: &CacheSnapshot, state: CacheState, search: &str, sort: SortKey) -> Self {
        Self {
            state,
            generation: snapshot.generation(),
            refreshed_at: snapshot.refreshed_at(),
            sort: sort.as_param(),
            items: snapshot.view(search, sort).iter().map(ItemResponse::from).collect(),
        }
    }
}
