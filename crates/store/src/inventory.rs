//! Typed inventory adapter over a `DocumentStore`.
//!
//! Document layout: key = item name, fields
//! `{ quantity: integer, expiration: string }`. Other fields may exist on a
//! document; merge writes leave them untouched.

use serde_json::{Number, Value as JsonValue};

use pantry_core::{Expiration, InventoryItem, ItemName};

use crate::document_store::{Document, DocumentStore, Fields, StoreError, WriteMode};

/// Collection holding inventory documents.
pub const INVENTORY_COLLECTION: &str = "inventory";

pub const QUANTITY_FIELD: &str = "quantity";
pub const EXPIRATION_FIELD: &str = "expiration";

/// Partial item payload for `InventoryStore::put`. `None` fields are not written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFields {
    pub quantity: Option<i64>,
    pub expiration: Option<Expiration>,
}

impl ItemFields {
    pub fn quantity(quantity: i64) -> Self {
        Self {
            quantity: Some(quantity),
            expiration: None,
        }
    }

    pub fn with_expiration(mut self, expiration: Expiration) -> Self {
        self.expiration = Some(expiration);
        self
    }

    fn into_fields(self) -> Fields {
        let mut fields = Fields::new();
        if let Some(q) = self.quantity {
            fields.insert(QUANTITY_FIELD.to_string(), JsonValue::Number(q.into()));
        }
        if let Some(e) = self.expiration {
            fields.insert(EXPIRATION_FIELD.to_string(), JsonValue::String(e.as_str().to_string()));
        }
        fields
    }
}

/// Raw stored state of one item, before the quantity >= 1 invariant is
/// applied. Mutations read this so that a zero or negative quantity written by
/// another client still goes through the add and collapse rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredItem {
    pub quantity: i64,
    pub expiration: Option<Expiration>,
}

/// Inventory store adapter: get/list/put/delete keyed by item name.
#[derive(Debug, Clone)]
pub struct InventoryStore<S> {
    docs: S,
}

impl<S> InventoryStore<S>
where
    S: DocumentStore,
{
    pub fn new(docs: S) -> Self {
        Self { docs }
    }

    pub fn documents(&self) -> &S {
        &self.docs
    }

    /// Point lookup. An absent item is `Ok(None)`.
    pub async fn get(&self, name: &ItemName) -> Result<Option<InventoryItem>, StoreError> {
        match self.docs.get(name.as_str()).await? {
            Some(doc) => decode_item(&doc).map(Some),
            None => Ok(None),
        }
    }

    /// Point lookup of the raw stored state. A missing quantity reads as 0.
    pub async fn get_stored(&self, name: &ItemName) -> Result<Option<StoredItem>, StoreError> {
        match self.docs.get(name.as_str()).await? {
            Some(doc) => decode_stored(&doc).map(Some),
            None => Ok(None),
        }
    }

    /// Every stored item, in no particular order.
    ///
    /// Documents that do not decode as items are skipped (and logged).
    pub async fn list_all(&self) -> Result<Vec<InventoryItem>, StoreError> {
        let docs = self.docs.list_all().await?;
        let mut items = Vec::with_capacity(docs.len());
        for doc in &docs {
            match decode_item(doc) {
                Ok(item) => items.push(item),
                Err(err) => tracing::warn!("skipping inventory document: {err}"),
            }
        }
        Ok(items)
    }

    pub async fn put(
        &self,
        name: &ItemName,
        fields: ItemFields,
        mode: WriteMode,
    ) -> Result<(), StoreError> {
        self.docs.put(name.as_str(), fields.into_fields(), mode).await
    }

    /// Idempotent delete.
    pub async fn delete(&self, name: &ItemName) -> Result<(), StoreError> {
        self.docs.delete(name.as_str()).await
    }
}

/// Decode a stored document into an item.
pub fn decode_item(doc: &Document) -> Result<InventoryItem, StoreError> {
    let name = ItemName::parse(doc.key.as_str())
        .map_err(|e| StoreError::decode(&doc.key, e.to_string()))?;
    if !doc.fields.contains_key(QUANTITY_FIELD) {
        return Err(StoreError::decode(&doc.key, "missing quantity"));
    }

    let StoredItem { quantity, expiration } = decode_stored(doc)?;
    InventoryItem::new(name, quantity, expiration).map_err(|e| StoreError::decode(&doc.key, e.to_string()))
}

/// Decode a document's fields without enforcing a positive quantity.
pub fn decode_stored(doc: &Document) -> Result<StoredItem, StoreError> {
    let quantity = match doc.fields.get(QUANTITY_FIELD) {
        None | Some(JsonValue::Null) => 0,
        Some(JsonValue::Number(n)) => integral(n)
            .ok_or_else(|| StoreError::decode(&doc.key, format!("quantity {n} is not an integer")))?,
        Some(other) => {
            return Err(StoreError::decode(
                &doc.key,
                format!("quantity is not a number: {other}"),
            ));
        }
    };

    let expiration = match doc.fields.get(EXPIRATION_FIELD) {
        None | Some(JsonValue::Null) => None,
        Some(JsonValue::String(s)) => Some(Expiration::new(s.as_str())),
        Some(other) => {
            return Err(StoreError::decode(
                &doc.key,
                format!("expiration is not a string: {other}"),
            ));
        }
    };

    Ok(StoredItem { quantity, expiration })
}

// Whole-valued doubles are accepted (some clients write numbers as doubles).
fn integral(n: &Number) -> Option<i64> {
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    let f = n.as_f64()?;
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}
