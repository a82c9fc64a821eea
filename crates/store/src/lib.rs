//! Store layer: keyed document storage for inventory items.
//!
//! - `document_store`: raw keyed-document boundary plus its backends
//!   (in-memory for tests/dev, Firestore REST for production).
//! - `inventory`: typed adapter translating `InventoryItem`s to documents.

pub mod document_store;
pub mod inventory;

pub use document_store::{
    Document, DocumentStore, Fields, FirestoreConfig, FirestoreDocumentStore,
    InMemoryDocumentStore, StoreError, WriteMode,
};
pub use inventory::{InventoryStore, ItemFields, StoredItem, INVENTORY_COLLECTION};
