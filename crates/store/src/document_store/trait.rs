use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

/// Field map of a document (field name -> JSON value).
pub type Fields = Map<String, JsonValue>;

/// A document read back from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub key: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(key: impl Into<String>, fields: Fields) -> Self {
        Self {
            key: key.into(),
            fields,
        }
    }
}

/// How `put` treats fields that already exist on the stored document.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WriteMode {
    /// Update only the given fields; every other stored field is preserved.
    /// Creates the document if it does not exist yet.
    Merge,
    /// Replace the whole document; fields not given are dropped.
    Replace,
}

/// Document store operation error.
///
/// These are **infrastructure errors** (network, remote status, decoding) as
/// opposed to domain errors (validation, invariants).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store transport failure: {0}")]
    Transport(String),

    #[error("store returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed document '{key}': {reason}")]
    Decode { key: String, reason: String },

    #[error("invalid document key: {0}")]
    InvalidKey(String),

    #[error("store lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub fn decode(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// A single collection of documents addressed by string keys.
///
/// ## Semantics
///
/// - `get` returns `Ok(None)` for an absent key; absence is not an error.
/// - `list_all` returns every document; no ordering is promised.
/// - `put` honours `WriteMode`. A `Merge` with no fields is a no-op.
/// - `delete` is idempotent: deleting an absent key succeeds.
///
/// Every call may perform network IO. Implementations do not retry.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Document>, StoreError>;

    async fn list_all(&self) -> Result<Vec<Document>, StoreError>;

    async fn put(&self, key: &str, fields: Fields, mode: WriteMode) -> Result<(), StoreError>;

    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

#[async_trait]
impl<S> DocumentStore for Arc<S>
where
    S: DocumentStore + ?Sized,
{
    async fn get(&self, key: &str) -> Result<Option<Document>, StoreError> {
        (**self).get(key).await
    }

    async fn list_all(&self) -> Result<Vec<Document>, StoreError> {
        (**self).list_all().await
    }

    async fn put(&self, key: &str, fields: Fields, mode: WriteMode) -> Result<(), StoreError> {
        (**self).put(key, fields, mode).await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        (**self).delete(key).await
    }
}
