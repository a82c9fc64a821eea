//! Pure filtering/ordering of a cached inventory snapshot.
//!
//! `view` never touches the store: same snapshot + same parameters always
//! produce the same output.

use core::cmp::Ordering;

use chrono::NaiveDateTime;
use icu_collator::{Collator, CollatorOptions, Strength};
use icu_provider::DataLocale;

use crate::item::InventoryItem;

/// Ordering requested by the presentation layer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum SortKey {
    /// Keep snapshot order.
    #[default]
    None,
    NameAsc,
    NameDesc,
    QuantityAsc,
    QuantityDesc,
    ExpirationAsc,
    ExpirationDesc,
}

impl SortKey {
    pub const ALL: [SortKey; 7] = [
        SortKey::None,
        SortKey::NameAsc,
        SortKey::NameDesc,
        SortKey::QuantityAsc,
        SortKey::QuantityDesc,
        SortKey::ExpirationAsc,
        SortKey::ExpirationDesc,
    ];

    /// Parse a query/menu value. Empty or unrecognized values map to `None`.
    pub fn from_param(raw: &str) -> Self {
        match raw.trim() {
            "nameAsc" => SortKey::NameAsc,
            "nameDesc" => SortKey::NameDesc,
            "quantityAsc" => SortKey::QuantityAsc,
            "quantityDesc" => SortKey::QuantityDesc,
            "expirationAsc" => SortKey::ExpirationAsc,
            "expirationDesc" => SortKey::ExpirationDesc,
            _ => SortKey::None,
        }
    }

    pub fn as_param(&self) -> &'static str {
        match self {
            SortKey::None => "",
            SortKey::NameAsc => "nameAsc",
            SortKey::NameDesc => "nameDesc",
            SortKey::QuantityAsc => "quantityAsc",
            SortKey::QuantityDesc => "quantityDesc",
            SortKey::ExpirationAsc => "expirationAsc",
            SortKey::ExpirationDesc => "expirationDesc",
        }
    }

    fn compare(&self, a: &InventoryItem, b: &InventoryItem) -> Ordering {
        match self {
            SortKey::None => Ordering::Equal,
            SortKey::NameAsc => locale_cmp(a.name().as_str(), b.name().as_str()),
            SortKey::NameDesc => locale_cmp(b.name().as_str(), a.name().as_str()),
            SortKey::QuantityAsc => a.quantity().cmp(&b.quantity()),
            SortKey::QuantityDesc => b.quantity().cmp(&a.quantity()),
            SortKey::ExpirationAsc => expiration_cmp(expiration_of(a), expiration_of(b), false),
            SortKey::ExpirationDesc => expiration_cmp(expiration_of(a), expiration_of(b), true),
        }
    }
}

/// Filter `items` by case-insensitive substring match on the name, then order
/// them by `sort`. The sort is stable, so ties (and `SortKey::None`) keep
/// snapshot order.
pub fn view(items: &[InventoryItem], search: &str, sort: SortKey) -> Vec<InventoryItem> {
    let needle = search.to_lowercase();
    let mut out: Vec<InventoryItem> = items
        .iter()
        .filter(|item| item.name().as_str().to_lowercase().contains(&needle))
        .cloned()
        .collect();

    if sort != SortKey::None {
        out.sort_by(|a, b| sort.compare(a, b));
    }
    out
}

thread_local! {
    static NAME_COLLATOR: Option<Collator> = root_collator();
}

// Root locale, tertiary strength: accents and case only break ties, and
// lowercase sorts before uppercase.
fn root_collator() -> Option<Collator> {
    let mut options = CollatorOptions::new();
    options.strength = Some(Strength::Tertiary);
    Collator::try_new(&DataLocale::default(), options).ok()
}

fn locale_cmp(a: &str, b: &str) -> Ordering {
    NAME_COLLATOR.with(|collator| match collator {
        Some(collator) => collator.compare(a, b),
        None => a
            .to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| b.cmp(a)),
    })
}

fn expiration_of(item: &InventoryItem) -> Option<NaiveDateTime> {
    item.expiration().and_then(|e| e.as_datetime())
}

// Unparseable or missing dates go last in both directions.
fn expiration_cmp(a: Option<NaiveDateTime>, b: Option<NaiveDateTime>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) if descending => b.cmp(&a),
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
