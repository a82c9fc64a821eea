use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::r#trait::{Document, DocumentStore, Fields, StoreError, WriteMode};

/// In-memory document collection.
///
/// Intended for tests/dev. Listing happens to be key-ordered; callers must
/// not rely on it.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    docs: RwLock<BTreeMap<String, Fields>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the collection with raw documents (e.g. fields this crate never writes).
    pub fn with_documents(docs: impl IntoIterator<Item = Document>) -> Self {
        Self {
            docs: RwLock::new(docs.into_iter().map(|d| (d.key, d.fields)).collect()),
        }
    }

    pub fn len(&self) -> usize {
        self.docs.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, key: &str) -> Result<Option<Document>, StoreError> {
        let docs = self.docs.read().map_err(|_| StoreError::Poisoned)?;
        Ok(docs.get(key).map(|fields| Document::new(key, fields.clone())))
    }

    async fn list_all(&self) -> Result<Vec<Document>, StoreError> {
        let docs = self.docs.read().map_err(|_| StoreError::Poisoned)?;
        Ok(docs
            .iter()
            .map(|(key, fields)| Document::new(key.clone(), fields.clone()))
            .collect())
    }

    async fn put(&self, key: &str, fields: Fields, mode: WriteMode) -> Result<(), StoreError> {
        if key.is_empty() {
            return Err(StoreError::InvalidKey("key cannot be empty".to_string()));
        }

        let mut docs = self.docs.write().map_err(|_| StoreError::Poisoned)?;
        match mode {
            WriteMode::Replace => {
                docs.insert(key.to_string(), fields);
            }
            WriteMode::Merge if fields.is_empty() => {}
            WriteMode::Merge => {
                let existing = docs.entry(key.to_string()).or_default();
                for (name, value) in fields {
                    existing.insert(name, value);
                }
            }
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut docs = self.docs.write().map_err(|_| StoreError::Poisoned)?;
        docs.remove(key);
        Ok(())
    }
}
