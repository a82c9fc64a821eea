//! `pantry-core`: inventory domain building blocks.
//!
//! This crate contains **pure domain** logic (no IO): the item model, its
//! validation rules, and the `view` transform used to filter and order a
//! cached inventory snapshot.

pub mod error;
pub mod item;
pub mod view;

pub use error::{DomainError, DomainResult};
pub use item::{Decrement, Expiration, InventoryItem, ItemName, MAX_NAME_BYTES, decrement, increment};
pub use view::{SortKey, view};
