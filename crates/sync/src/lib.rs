//! Inventory sync core.
//!
//! Owns the client-side inventory cache and the mutation protocol against the
//! store:
//! - every mutation is a read-modify-write (or delete) followed by a full
//!   refresh; the cache is only ever replaced wholesale, never patched
//! - an item whose quantity would reach zero is deleted, not stored
//! - mutations of the same item name are serialized in-process
//!
//! The presentation layer reads `snapshot()` and re-renders on `subscribe()`
//! notices.

pub mod error;
pub mod locks;
pub mod snapshot;
pub mod sync;

#[cfg(test)]
mod integration_tests;

pub use error::SyncError;
pub use locks::{KeyGuard, KeyedLocks};
pub use snapshot::{CacheSnapshot, CacheState, RefreshNotice};
pub use sync::{DecrementOutcome, InventorySync};
