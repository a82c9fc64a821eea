//! Keyed document store boundary.
//!
//! This module defines a storage-agnostic abstraction over a single collection
//! of documents addressed by string keys, and the backends implementing it.

pub mod firestore;
pub mod in_memory;
pub mod r#trait;

pub use firestore::{FirestoreConfig, FirestoreDocumentStore};
pub use in_memory::InMemoryDocumentStore;
pub use r#trait::{Document, DocumentStore, Fields, StoreError, WriteMode};
