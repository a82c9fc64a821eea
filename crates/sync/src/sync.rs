//! `InventorySync`: cache ownership and the mutation protocol.
//!
//! ```text
//! add_item / decrement_item / delete_all_of
//!   ↓
//! 1. Validate the name (no store access on failure)
//!   ↓
//! 2. Lock the name (same-name mutations run one at a time)
//!   ↓
//! 3. Read-modify-write (or delete) against the store
//!   ↓
//! 4. Full refresh: list the collection and replace the cache
//!   ↓
//! 5. Broadcast a RefreshNotice
//! ```
//!
//! Refreshes carry a read ticket taken before listing. A listing that
//! finishes after a newer one has already been installed is discarded, so the
//! cache never moves backwards. When a mutation finishes it records the latest
//! ticket handed out; a listing holding that ticket or an older one may predate
//! the write, so installing it leaves the cache stale.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use tokio::sync::broadcast;
use tracing::instrument;

use pantry_core::{Decrement, Expiration, InventoryItem, ItemName, SortKey, decrement, increment};
use pantry_store::{DocumentStore, InventoryStore, ItemFields, WriteMode};

use crate::error::SyncError;
use crate::locks::KeyedLocks;
use crate::snapshot::{CacheSnapshot, CacheState, RefreshNotice};

const NOTICE_CAPACITY: usize = 64;

/// What a decrement did to the stored item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecrementOutcome {
    /// No such item; nothing was written.
    Absent,
    /// The last unit was removed, so the document was deleted.
    Deleted,
    Remaining(i64),
}

/// Client-side inventory cache kept in step with a document store.
pub struct InventorySync<S> {
    store: InventoryStore<S>,
    cache: RwLock<CacheSnapshot>,
    stale: AtomicBool,
    pending_mutations: AtomicUsize,
    read_tickets: AtomicU64,
    /// Highest read ticket issued when a mutation last finished.
    settled_at: AtomicU64,
    locks: KeyedLocks,
    notices: broadcast::Sender<RefreshNotice>,
}

struct PendingMutation<'a> {
    pending: &'a AtomicUsize,
    read_tickets: &'a AtomicU64,
    settled_at: &'a AtomicU64,
}

impl Drop for PendingMutation<'_> {
    fn drop(&mut self) {
        // Record the settle point before the count drops, so `install` never
        // sees zero pending with an outdated mark.
        let issued = self.read_tickets.load(Ordering::SeqCst);
        self.settled_at.fetch_max(issued, Ordering::SeqCst);
        self.pending.fetch_sub(1, Ordering::SeqCst);
    }
}

impl<S> InventorySync<S>
where
    S: DocumentStore,
{
    /// Empty, stale cache over `store`. Call `refresh` to populate it.
    pub fn new(store: InventoryStore<S>) -> Self {
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        Self {
            store,
            cache: RwLock::new(CacheSnapshot::empty()),
            stale: AtomicBool::new(true),
            pending_mutations: AtomicUsize::new(0),
            read_tickets: AtomicU64::new(0),
            settled_at: AtomicU64::new(0),
            locks: KeyedLocks::new(),
            notices,
        }
    }

    pub fn store(&self) -> &InventoryStore<S> {
        &self.store
    }

    /// Current cache contents.
    pub fn snapshot(&self) -> CacheSnapshot {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn items(&self) -> Vec<InventoryItem> {
        self.snapshot().items().to_vec()
    }

    pub fn state(&self) -> CacheState {
        if self.stale.load(Ordering::SeqCst) {
            CacheState::Stale
        } else {
            CacheState::Fresh
        }
    }

    /// Filtered and sorted cache contents. Pure; never touches the store.
    pub fn view(&self, search: &str, sort: SortKey) -> Vec<InventoryItem> {
        self.snapshot().view(search, sort)
    }

    /// Receive a notice after every installed refresh.
    pub fn subscribe(&self) -> broadcast::Receiver<RefreshNotice> {
        self.notices.subscribe()
    }

    /// Replace the cache with the store's full contents.
    ///
    /// On failure the cache keeps its previous contents and is marked stale.
    #[instrument(skip(self), err)]
    pub async fn refresh(&self) -> Result<CacheSnapshot, SyncError> {
        let ticket = self.read_tickets.fetch_add(1, Ordering::SeqCst) + 1;

        let items = match self.store.list_all().await {
            Ok(items) => items,
            Err(err) => {
                self.stale.store(true, Ordering::SeqCst);
                return Err(err.into());
            }
        };

        Ok(self.install(ticket, items))
    }

    /// Add one unit of `name`.
    ///
    /// A new item is created with quantity 1. An existing item is merged with
    /// quantity + 1, and its expiration is overwritten by `expiration`.
    #[instrument(skip(self, expiration), err)]
    pub async fn add_item(
        &self,
        name: &str,
        expiration: Expiration,
    ) -> Result<CacheSnapshot, SyncError> {
        let name = parse_name(name)?;
        {
            let _pending = self.begin_mutation();
            let _guard = self.locks.lock(name.as_str()).await;
            let quantity = self.apply_add(&name, expiration).await?;
            tracing::info!(item = %name, quantity, "item added");
        }
        self.refresh().await
    }

    /// Remove one unit of `name`. The document is deleted when the last unit
    /// goes; an absent item is left alone.
    #[instrument(skip(self), err)]
    pub async fn decrement_item(&self, name: &str) -> Result<CacheSnapshot, SyncError> {
        let name = parse_name(name)?;
        {
            let _pending = self.begin_mutation();
            let _guard = self.locks.lock(name.as_str()).await;
            let outcome = self.apply_decrement(&name).await?;
            tracing::info!(item = %name, ?outcome, "item decremented");
        }
        self.refresh().await
    }

    /// Delete `name` outright, whatever its quantity. Idempotent.
    #[instrument(skip(self), err)]
    pub async fn delete_all_of(&self, name: &str) -> Result<CacheSnapshot, SyncError> {
        let name = parse_name(name)?;
        {
            let _pending = self.begin_mutation();
            let _guard = self.locks.lock(name.as_str()).await;
            self.store.delete(&name).await?;
            tracing::info!(item = %name, "item deleted");
        }
        self.refresh().await
    }

    async fn apply_add(&self, name: &ItemName, expiration: Expiration) -> Result<i64, SyncError> {
        match self.store.get_stored(name).await? {
            Some(stored) => {
                let quantity = increment(stored.quantity)?;
                let fields = ItemFields::quantity(quantity).with_expiration(expiration);
                self.store.put(name, fields, WriteMode::Merge).await?;
                Ok(quantity)
            }
            None => {
                let item = InventoryItem::first(name.clone(), expiration);
                let fields = ItemFields {
                    quantity: Some(item.quantity()),
                    expiration: item.expiration().cloned(),
                };
                self.store.put(name, fields, WriteMode::Replace).await?;
                Ok(item.quantity())
            }
        }
    }

    async fn apply_decrement(&self, name: &ItemName) -> Result<DecrementOutcome, SyncError> {
        let Some(stored) = self.store.get_stored(name).await? else {
            return Ok(DecrementOutcome::Absent);
        };
        match decrement(stored.quantity) {
            Decrement::Collapse => {
                self.store.delete(name).await?;
                Ok(DecrementOutcome::Deleted)
            }
            Decrement::Remaining(quantity) => {
                self.store
                    .put(name, ItemFields::quantity(quantity), WriteMode::Merge)
                    .await?;
                Ok(DecrementOutcome::Remaining(quantity))
            }
        }
    }

    fn begin_mutation(&self) -> PendingMutation<'_> {
        self.pending_mutations.fetch_add(1, Ordering::SeqCst);
        self.stale.store(true, Ordering::SeqCst);
        PendingMutation {
            pending: &self.pending_mutations,
            read_tickets: &self.read_tickets,
            settled_at: &self.settled_at,
        }
    }

    fn install(&self, ticket: u64, items: Vec<InventoryItem>) -> CacheSnapshot {
        // The snapshot is replaced wholesale, so a poisoned lock never holds a
        // half-written value.
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        if ticket <= cache.read_ticket {
            tracing::debug!(ticket, installed = cache.read_ticket, "discarding superseded refresh");
            return cache.clone();
        }

        let next = cache.next(items, ticket);
        *cache = next.clone();
        if self.pending_mutations.load(Ordering::SeqCst) == 0
            && ticket > self.settled_at.load(Ordering::SeqCst)
        {
            self.stale.store(false, Ordering::SeqCst);
        }
        drop(cache);

        tracing::debug!(generation = next.generation(), items = next.items().len(), "cache refreshed");
        if let Some(refreshed_at) = next.refreshed_at() {
            // No subscribers is not an error.
            let _ = self.notices.send(RefreshNotice {
                generation: next.generation(),
                item_count: next.items().len(),
                refreshed_at,
            });
        }
        next
    }
}

fn parse_name(raw: &str) -> Result<ItemName, SyncError> {
    ItemName::parse(raw).map_err(|err| {
        tracing::warn!("rejected item name {raw:?}: {err}");
        SyncError::from(err)
    })
}
