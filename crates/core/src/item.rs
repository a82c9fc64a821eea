use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{DomainError, DomainResult};

/// Longest accepted name, in UTF-8 bytes (the document id limit).
pub const MAX_NAME_BYTES: usize = 1500;

/// Item name: the document key of an inventory item.
///
/// Names are case-preserved and compared by exact string match. A name must
/// be usable as a document id in every backend:
/// - at least one non-whitespace character
/// - no `/`
/// - not `.` or `..`
/// - not of the reserved form `__name__`
/// - at most `MAX_NAME_BYTES` bytes
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemName(String);

impl ItemName {
    pub fn parse(raw: impl Into<String>) -> DomainResult<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(DomainError::validation("item name cannot be empty"));
        }
        if raw.contains('/') {
            return Err(DomainError::validation(format!(
                "item name cannot contain '/': {raw:?}"
            )));
        }
        if raw == "." || raw == ".." {
            return Err(DomainError::validation(format!("item name {raw:?} is reserved")));
        }
        if raw.len() >= 4 && raw.starts_with("__") && raw.ends_with("__") {
            return Err(DomainError::validation(format!(
                "item name {raw:?} uses the reserved __name__ form"
            )));
        }
        if raw.len() > MAX_NAME_BYTES {
            return Err(DomainError::validation(format!(
                "item name exceeds {MAX_NAME_BYTES} bytes"
            )));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name with its first character upper-cased, for display only.
    pub fn display_name(&self) -> String {
        let mut chars = self.0.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl TryFrom<String> for ItemName {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<ItemName> for String {
    fn from(value: ItemName) -> Self {
        value.0
    }
}

impl core::fmt::Display for ItemName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Expiration date as entered by the user.
///
/// Stored verbatim; the format is not validated. `as_datetime` interprets the
/// common shapes (`2025-01-31`, `2025-01-31T08:00`, RFC 3339) for ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Expiration(String);

impl Expiration {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse into a UTC-naive timestamp; `None` when the text is not date-like.
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        let raw = self.0.trim();
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return date.and_hms_opt(0, 0, 0);
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.naive_utc());
        }
        ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    }
}

impl From<&str> for Expiration {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Expiration {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl core::fmt::Display for Expiration {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of removing one unit from an item.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Decrement {
    /// The item stays, with this quantity.
    Remaining(i64),
    /// The quantity would drop to zero or below; the item must be deleted.
    Collapse,
}

/// One named inventory line.
///
/// `quantity` is always >= 1; an item that would reach zero stops existing.
/// Deserialization goes through `InventoryItem::new`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryItem {
    name: ItemName,
    quantity: i64,
    expiration: Option<Expiration>,
}

impl InventoryItem {
    pub fn new(
        name: ItemName,
        quantity: i64,
        expiration: Option<Expiration>,
    ) -> DomainResult<Self> {
        if quantity < 1 {
            return Err(DomainError::invariant(format!(
                "quantity of '{name}' must be at least 1, got {quantity}"
            )));
        }
        Ok(Self {
            name,
            quantity,
            expiration,
        })
    }

    /// A freshly added item: quantity 1.
    pub fn first(name: ItemName, expiration: Expiration) -> Self {
        Self {
            name,
            quantity: 1,
            expiration: Some(expiration),
        }
    }

    pub fn name(&self) -> &ItemName {
        &self.name
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn expiration(&self) -> Option<&Expiration> {
        self.expiration.as_ref()
    }

    pub fn display_name(&self) -> String {
        self.name.display_name()
    }
}

impl<'de> Deserialize<'de> for InventoryItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            name: ItemName,
            quantity: i64,
            #[serde(default)]
            expiration: Option<Expiration>,
        }

        let raw = Raw::deserialize(deserializer)?;
        InventoryItem::new(raw.name, raw.quantity, raw.expiration).map_err(serde::de::Error::custom)
    }
}

/// Quantity after adding one unit to a raw stored quantity.
///
/// A stored quantity of zero or below counts as nothing on hand, so the
/// result is 1.
pub fn increment(stored: i64) -> DomainResult<i64> {
    stored
        .max(0)
        .checked_add(1)
        .ok_or_else(|| DomainError::invariant(format!("quantity {stored} cannot be incremented")))
}

/// Quantity-collapse rule on a raw stored quantity.
pub fn decrement(quantity: i64) -> Decrement {
    match quantity.checked_sub(1) {
        Some(next) if next > 0 => Decrement::Remaining(next),
        _ => Decrement::Collapse,
    }
}
