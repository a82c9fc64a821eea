//! End-to-end tests of the sync core over the in-memory document store.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use proptest::prelude::*;
use serde_json::{Value as JsonValue, json};

use pantry_core::{Expiration, ItemName, SortKey};
use pantry_store::{
    Document, DocumentStore, Fields, InMemoryDocumentStore, InventoryStore, StoreError, WriteMode,
};

use crate::{CacheState, InventorySync, SyncError};

type MemSync = InventorySync<Arc<InMemoryDocumentStore>>;

fn setup() -> (Arc<InMemoryDocumentStore>, MemSync) {
    let docs = Arc::new(InMemoryDocumentStore::new());
    let sync = InventorySync::new(InventoryStore::new(docs.clone()));
    (docs, sync)
}

fn doc(key: &str, fields: JsonValue) -> Document {
    Document::new(key, fields.as_object().cloned().unwrap())
}

fn exp(s: &str) -> Expiration {
    Expiration::new(s)
}

fn quantities<S: DocumentStore>(sync: &InventorySync<S>) -> Vec<(String, i64)> {
    let mut out: Vec<(String, i64)> = sync
        .items()
        .iter()
        .map(|i| (i.name().as_str().to_string(), i.quantity()))
        .collect();
    out.sort();
    out
}

/// Wraps a store and fails selected operations on demand.
#[derive(Default)]
struct FlakyStore {
    inner: InMemoryDocumentStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl FlakyStore {
    fn outage() -> StoreError {
        StoreError::Transport("connection refused".to_string())
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn get(&self, key: &str) -> Result<Option<Document>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Self::outage());
        }
        self.inner.get(key).await
    }

    async fn list_all(&self) -> Result<Vec<Document>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Self::outage());
        }
        self.inner.list_all().await
    }

    async fn put(&self, key: &str, fields: Fields, mode: WriteMode) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::outage());
        }
        self.inner.put(key, fields, mode).await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::outage());
        }
        self.inner.delete(key).await
    }
}

#[tokio::test]
async fn add_to_empty_store_creates_item_with_quantity_one() {
    let (docs, sync) = setup();

    let snap = sync.add_item("apple", exp("2025-01-01")).await.unwrap();

    assert_eq!(snap.items().len(), 1);
    let item = &snap.items()[0];
    assert_eq!(item.name().as_str(), "apple");
    assert_eq!(item.quantity(), 1);
    assert_eq!(item.expiration().unwrap().as_str(), "2025-01-01");

    let raw = docs.get("apple").await.unwrap().unwrap();
    assert_eq!(raw.fields, json!({ "quantity": 1, "expiration": "2025-01-01" }).as_object().cloned().unwrap());
}

#[tokio::test]
async fn add_existing_increments_and_overwrites_expiration() {
    let (_docs, sync) = setup();
    sync.add_item("apple", exp("2025-01-01")).await.unwrap();

    let snap = sync.add_item("apple", exp("2025-02-01")).await.unwrap();

    assert_eq!(snap.items().len(), 1);
    assert_eq!(snap.items()[0].quantity(), 2);
    assert_eq!(snap.items()[0].expiration().unwrap().as_str(), "2025-02-01");
}

#[tokio::test]
async fn add_merges_and_keeps_unrelated_fields() {
    let docs = Arc::new(InMemoryDocumentStore::with_documents([doc(
        "apple",
        json!({ "quantity": 4, "expiration": "2025-01-01", "aisle": "produce" }),
    )]));
    let sync = InventorySync::new(InventoryStore::new(docs.clone()));

    sync.add_item("apple", exp("2025-03-01")).await.unwrap();

    let raw = docs.get("apple").await.unwrap().unwrap();
    assert_eq!(raw.fields["quantity"], 5);
    assert_eq!(raw.fields["expiration"], "2025-03-01");
    assert_eq!(raw.fields["aisle"], "produce");
}

#[tokio::test]
async fn decrement_above_one_keeps_item() {
    let (docs, sync) = setup();
    docs.put("milk", json!({ "quantity": 3, "expiration": "2025-05-05" }).as_object().cloned().unwrap(), WriteMode::Replace)
        .await
        .unwrap();

    let snap = sync.decrement_item("milk").await.unwrap();

    assert_eq!(snap.items()[0].quantity(), 2);
    assert_eq!(snap.items()[0].expiration().unwrap().as_str(), "2025-05-05");
}

#[tokio::test]
async fn decrement_of_last_unit_deletes_the_document() {
    let (docs, sync) = setup();
    sync.add_item("milk", exp("2025-05-05")).await.unwrap();

    let snap = sync.decrement_item("milk").await.unwrap();

    assert!(snap.items().is_empty());
    assert!(docs.get("milk").await.unwrap().is_none());
}

#[tokio::test]
async fn decrement_of_absent_item_writes_nothing() {
    let (docs, sync) = setup();
    sync.add_item("bread", exp("2025-01-01")).await.unwrap();

    let snap = sync.decrement_item("ghost").await.unwrap();

    assert_eq!(docs.len(), 1);
    assert_eq!(snap.items().len(), 1);
    assert_eq!(snap.items()[0].name().as_str(), "bread");
}

#[tokio::test]
async fn delete_all_of_removes_regardless_of_quantity() {
    let (docs, sync) = setup();
    for _ in 0..5 {
        sync.add_item("rice", exp("2026-01-01")).await.unwrap();
    }
    sync.add_item("beans", exp("2026-01-01")).await.unwrap();

    let snap = sync.delete_all_of("rice").await.unwrap();

    assert_eq!(snap.items().len(), 1);
    assert_eq!(snap.items()[0].name().as_str(), "beans");
    assert!(docs.get("rice").await.unwrap().is_none());
}

#[tokio::test]
async fn delete_all_of_absent_item_is_ok() {
    let (_docs, sync) = setup();
    let snap = sync.delete_all_of("ghost").await.unwrap();
    assert!(snap.items().is_empty());
}

#[tokio::test]
async fn refresh_mirrors_store_and_is_idempotent() {
    let docs = Arc::new(InMemoryDocumentStore::with_documents([
        doc("apple", json!({ "quantity": 2, "expiration": "2025-01-01" })),
        doc("bread", json!({ "quantity": 1, "expiration": "2025-01-03" })),
    ]));
    let sync = InventorySync::new(InventoryStore::new(docs));
    assert_eq!(sync.state(), CacheState::Stale);
    assert!(sync.items().is_empty());

    let first = sync.refresh().await.unwrap();
    let second = sync.refresh().await.unwrap();

    assert_eq!(sync.state(), CacheState::Fresh);
    assert_eq!(first.items(), second.items());
    assert_eq!(second.generation(), first.generation() + 1);
    assert_eq!(quantities(&sync), vec![("apple".to_string(), 2), ("bread".to_string(), 1)]);
}

#[tokio::test]
async fn refresh_picks_up_changes_made_by_other_writers() {
    let (docs, sync) = setup();
    sync.refresh().await.unwrap();

    docs.put("tea", json!({ "quantity": 7 }).as_object().cloned().unwrap(), WriteMode::Replace)
        .await
        .unwrap();
    assert!(sync.items().is_empty());

    sync.refresh().await.unwrap();
    assert_eq!(quantities(&sync), vec![("tea".to_string(), 7)]);
}

#[tokio::test]
async fn malformed_documents_are_left_out_of_the_cache() {
    let docs = Arc::new(InMemoryDocumentStore::with_documents([
        doc("apple", json!({ "quantity": 1, "expiration": "2025-01-01" })),
        doc("zero", json!({ "quantity": 0 })),
        doc("words", json!({ "quantity": "lots" })),
    ]));
    let sync = InventorySync::new(InventoryStore::new(docs));

    sync.refresh().await.unwrap();
    assert_eq!(quantities(&sync), vec![("apple".to_string(), 1)]);
}

#[tokio::test]
async fn decrement_of_non_positive_stored_quantity_deletes_the_document() {
    let docs = Arc::new(InMemoryDocumentStore::with_documents([
        doc("zero", json!({ "quantity": 0 })),
        doc("negative", json!({ "quantity": -2, "expiration": "2025-01-01" })),
    ]));
    let sync = InventorySync::new(InventoryStore::new(docs.clone()));

    sync.decrement_item("zero").await.unwrap();
    sync.decrement_item("negative").await.unwrap();

    assert!(docs.is_empty());
    assert_eq!(sync.state(), CacheState::Fresh);
}

#[tokio::test]
async fn add_over_non_positive_stored_quantity_restarts_at_one() {
    let docs = Arc::new(InMemoryDocumentStore::with_documents([doc(
        "milk",
        json!({ "quantity": -3, "expiration": "2024-12-01", "aisle": "dairy" }),
    )]));
    let sync = InventorySync::new(InventoryStore::new(docs.clone()));

    sync.add_item("milk", exp("2025-01-01")).await.unwrap();

    let raw = docs.get("milk").await.unwrap().unwrap();
    assert_eq!(raw.fields["quantity"], 1);
    assert_eq!(raw.fields["expiration"], "2025-01-01");
    assert_eq!(raw.fields["aisle"], "dairy");
    assert_eq!(quantities(&sync), vec![("milk".to_string(), 1)]);
}

#[tokio::test]
async fn invalid_names_are_rejected_without_touching_the_store() {
    let store = Arc::new(FlakyStore::default());
    store.fail_reads.store(true, Ordering::SeqCst);
    store.fail_writes.store(true, Ordering::SeqCst);
    let sync = InventorySync::new(InventoryStore::new(store));

    let too_long = "x".repeat(1501);
    for bad in ["", "   ", "a/b", ".", "..", "__name__", too_long.as_str()] {
        assert!(matches!(sync.add_item(bad, exp("2025-01-01")).await, Err(SyncError::InvalidArgument(_))));
        assert!(matches!(sync.decrement_item(bad).await, Err(SyncError::InvalidArgument(_))));
        assert!(matches!(sync.delete_all_of(bad).await, Err(SyncError::InvalidArgument(_))));
    }
}

#[tokio::test]
async fn failed_write_leaves_cache_unchanged() {
    let store = Arc::new(FlakyStore::default());
    let sync = InventorySync::new(InventoryStore::new(store.clone()));
    sync.add_item("apple", exp("2025-01-01")).await.unwrap();
    let before = sync.snapshot();

    store.fail_writes.store(true, Ordering::SeqCst);
    let err = sync.add_item("apple", exp("2025-09-09")).await.unwrap_err();

    assert!(matches!(err, SyncError::StoreUnavailable(StoreError::Transport(_))));
    let after = sync.snapshot();
    assert_eq!(after.generation(), before.generation());
    assert_eq!(after.items(), before.items());
    assert_eq!(sync.state(), CacheState::Stale);

    store.fail_writes.store(false, Ordering::SeqCst);
    sync.refresh().await.unwrap();
    assert_eq!(sync.state(), CacheState::Fresh);
    assert_eq!(quantities(&sync), vec![("apple".to_string(), 1)]);
}

#[tokio::test]
async fn failed_refresh_keeps_last_good_snapshot() {
    let store = Arc::new(FlakyStore::default());
    let sync = InventorySync::new(InventoryStore::new(store.clone()));
    sync.add_item("apple", exp("2025-01-01")).await.unwrap();

    store.fail_reads.store(true, Ordering::SeqCst);
    assert!(matches!(sync.refresh().await, Err(SyncError::StoreUnavailable(_))));
    assert!(matches!(sync.decrement_item("apple").await, Err(SyncError::StoreUnavailable(_))));

    assert_eq!(quantities(&sync), vec![("apple".to_string(), 1)]);
    assert_eq!(sync.state(), CacheState::Stale);
}

#[tokio::test]
async fn concurrent_adds_of_one_name_are_not_lost() {
    let docs = Arc::new(InMemoryDocumentStore::new());
    let sync = Arc::new(InventorySync::new(InventoryStore::new(docs.clone())));

    let mut tasks = Vec::new();
    for _ in 0..20 {
        let sync = sync.clone();
        tasks.push(tokio::spawn(async move {
            sync.add_item("apple", Expiration::new("2025-01-01")).await
        }));
    }
    for t in tasks {
        t.await.unwrap().unwrap();
    }

    let raw = docs.get("apple").await.unwrap().unwrap();
    assert_eq!(raw.fields["quantity"], 20);

    sync.refresh().await.unwrap();
    assert_eq!(quantities(&sync), vec![("apple".to_string(), 20)]);
    assert_eq!(sync.state(), CacheState::Fresh);
}

#[tokio::test]
async fn subscribers_are_notified_after_each_refresh() {
    let (_docs, sync) = setup();
    let mut rx = sync.subscribe();

    sync.add_item("apple", exp("2025-01-01")).await.unwrap();
    sync.add_item("bread", exp("2025-01-02")).await.unwrap();

    let first = rx.recv().await.unwrap();
    let second = rx.recv().await.unwrap();
    assert_eq!((first.generation, first.item_count), (1, 1));
    assert_eq!((second.generation, second.item_count), (2, 2));
}

#[tokio::test]
async fn scenario_add_add_decrement_decrement() {
    let (_docs, sync) = setup();

    sync.add_item("Apple", exp("2025-01-01")).await.unwrap();
    sync.add_item("Apple", exp("2025-01-01")).await.unwrap();
    assert_eq!(quantities(&sync), vec![("Apple".to_string(), 2)]);

    sync.decrement_item("Apple").await.unwrap();
    assert_eq!(quantities(&sync), vec![("Apple".to_string(), 1)]);

    sync.decrement_item("Apple").await.unwrap();
    assert!(sync.items().is_empty());
}

#[tokio::test]
async fn view_reads_the_cache_only() {
    let store = Arc::new(FlakyStore::default());
    let sync = InventorySync::new(InventoryStore::new(store.clone()));
    sync.add_item("banana", exp("2025-03-01")).await.unwrap();
    sync.add_item("apple", exp("2025-01-01")).await.unwrap();
    sync.add_item("apple", exp("2025-01-01")).await.unwrap();

    store.fail_reads.store(true, Ordering::SeqCst);

    let by_qty = sync.view("", SortKey::QuantityDesc);
    let names: Vec<&str> = by_qty.iter().map(|i| i.name().as_str()).collect();
    assert_eq!(names, vec!["apple", "banana"]);

    let found = sync.view("AN", SortKey::None);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name(), &ItemName::parse("banana").unwrap());
}

#[derive(Debug, Clone)]
enum Op {
    Add(usize),
    Decrement(usize),
    DeleteAll(usize),
}

const NAMES: [&str; 3] = ["apple", "bread", "milk"];

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..NAMES.len()).prop_map(Op::Add),
        (0..NAMES.len()).prop_map(Op::Decrement),
        (0..NAMES.len()).prop_map(Op::DeleteAll),
    ]
}

proptest! {
    /// Any sequence of mutations leaves the cache equal to a simple counter
    /// model, with no zero or negative quantities.
    #[test]
    fn cache_tracks_counter_model(ops in prop::collection::vec(arb_op(), 0..30)) {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let (model, cached) = rt.block_on(async {
            let (_docs, sync) = setup();
            let mut model = std::collections::BTreeMap::<String, i64>::new();
            for op in &ops {
                match *op {
                    Op::Add(i) => {
                        sync.add_item(NAMES[i], Expiration::new("2025-01-01")).await.unwrap();
                        *model.entry(NAMES[i].to_string()).or_default() += 1;
                    }
                    Op::Decrement(i) => {
                        sync.decrement_item(NAMES[i]).await.unwrap();
                        if let Some(q) = model.get_mut(NAMES[i]) {
                            *q -= 1;
                            if *q == 0 {
                                model.remove(NAMES[i]);
                            }
                        }
                    }
                    Op::DeleteAll(i) => {
                        sync.delete_all_of(NAMES[i]).await.unwrap();
                        model.remove(NAMES[i]);
                    }
                }
            }
            (model.into_iter().collect::<Vec<_>>(), quantities(&sync))
        });

        prop_assert!(cached.iter().all(|(_, q)| *q >= 1));
        prop_assert_eq!(cached, model);
    }
}
