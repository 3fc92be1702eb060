//! Products held for side-by-side comparison.
//!
//! Independent of the session: entries survive login and logout and are
//! removed only by an explicit clear.

use std::sync::Mutex;

use pricewatch_core::{Offer, Price, ProductId, SearchResult};

use crate::sync::lock;

/// Cell text for a service that has no offer for the row's product.
pub const PLACEHOLDER: &str = "-";

/// A frozen snapshot of one product's offers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonEntry {
    pub id: ProductId,
    pub name: String,
    pub offers: Vec<Offer>,
}

impl ComparisonEntry {
    #[must_use]
    pub fn new(id: ProductId, name: impl Into<String>, offers: Vec<Offer>) -> Self {
        Self {
            id,
            name: name.into(),
            offers,
        }
    }

    /// Row label: `name (id)`, or just the name when the two coincide.
    #[must_use]
    pub fn label(&self) -> String {
        if self.id.as_str() == self.name {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.id)
        }
    }

    /// Price quoted by `service`, if any.
    #[must_use]
    pub fn price_from(&self, service: &str) -> Option<Price> {
        self.offers
            .iter()
            .find(|offer| offer.service == service)
            .map(|offer| offer.price)
    }
}

impl From<&SearchResult> for ComparisonEntry {
    fn from(result: &SearchResult) -> Self {
        Self::new(
            result.product_id.clone(),
            result.product_name.clone(),
            result.offers.clone(),
        )
    }
}

/// One row of the comparison table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonRow {
    pub label: String,
    /// One cell per column; `None` where the product has no offer.
    pub cells: Vec<Option<Price>>,
}

impl ComparisonRow {
    /// Cells as display text, with [`PLACEHOLDER`] for missing offers.
    #[must_use]
    pub fn cell_texts(&self) -> Vec<String> {
        self.cells
            .iter()
            .map(|cell| cell.map_or_else(|| PLACEHOLDER.to_owned(), |price| price.to_string()))
            .collect()
    }
}

/// Projection of the comparison store into a table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComparisonTable {
    /// Distinct service names in first-seen order.
    pub columns: Vec<String>,
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonTable {
    #[must_use]
    pub fn from_entries(entries: &[ComparisonEntry]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for offer in entries.iter().flat_map(|entry| &entry.offers) {
            if !columns.contains(&offer.service) {
                columns.push(offer.service.clone());
            }
        }

        let rows = entries
            .iter()
            .map(|entry| ComparisonRow {
                label: entry.label(),
                cells: columns
                    .iter()
                    .map(|service| entry.price_from(service))
                    .collect(),
            })
            .collect();

        Self { columns, rows }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Holder of the comparison entries, in insertion order.
#[derive(Debug, Default)]
pub struct ComparisonStore {
    entries: Mutex<Vec<ComparisonEntry>>,
}

impl ComparisonStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `entry` unless one with the same id is present.
    /// Returns whether the store changed.
    pub fn add(&self, entry: ComparisonEntry) -> bool {
        let mut entries = lock(&self.entries);
        if entries.iter().any(|existing| existing.id == entry.id) {
            return false;
        }
        entries.push(entry);
        true
    }

    /// Remove every entry, returning how many were removed.
    pub fn clear(&self) -> usize {
        let mut entries = lock(&self.entries);
        let removed = entries.len();
        entries.clear();
        removed
    }

    #[must_use]
    pub fn entries(&self) -> Vec<ComparisonEntry> {
        lock(&self.entries).clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn table(&self) -> ComparisonTable {
        ComparisonTable::from_entries(&lock(&self.entries))
    }
}
