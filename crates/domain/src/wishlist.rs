//! Wishlist: a deduplicated set of saved products.

use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use common::ProductId;
use persistence::PersistenceAdapter;
use serde::{Deserialize, Serialize};

use crate::product::Product;
use crate::restore::{self, RestoreStatus};

/// Snapshot section the wishlist is persisted under.
pub const WISHLIST_SECTION: &str = "wishlist";

/// A saved product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistEntry {
    /// The product as it looked when saved.
    pub product: Product,

    /// When the product was saved.
    pub added_at: DateTime<Utc>,
}

impl WishlistEntry {
    /// Returns the saved product's id.
    pub fn product_id(&self) -> &ProductId {
        &self.product.id
    }
}

/// Result of [`WishlistStore::toggle`].
///
/// `AlreadyPresent` is informational: the wishlist is unchanged and the UI
/// is expected to tell the shopper so.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WishlistOutcome {
    Added,
    AlreadyPresent,
}

impl WishlistOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            WishlistOutcome::Added => "added",
            WishlistOutcome::AlreadyPresent => "already_present",
        }
    }
}

/// Read view of the wishlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WishlistView {
    pub entries: Vec<WishlistEntry>,
}

/// Owner of the wishlist entries. Clones are handles onto the same list.
#[derive(Debug, Clone)]
pub struct WishlistStore {
    entries: Arc<RwLock<Vec<WishlistEntry>>>,
    persistence: PersistenceAdapter,
}

impl WishlistStore {
    /// Creates an empty wishlist writing through `persistence`.
    pub fn new(persistence: PersistenceAdapter) -> Self {
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
            persistence,
        }
    }

    /// Replaces the in-memory wishlist with the active identity's persisted one.
    pub fn restore(&self) -> RestoreStatus {
        let loaded =
            restore::load_section::<Vec<WishlistEntry>>(&self.persistence, WISHLIST_SECTION);
        let status = match loaded {
            Ok(None) => {
                self.replace(Vec::new());
                RestoreStatus::Empty
            }
            Ok(Some(entries)) => {
                let mut seen = HashSet::new();
                let duplicate = entries
                    .iter()
                    .find(|e| !seen.insert(e.product_id().clone()))
                    .map(|e| e.product_id().clone());
                match duplicate {
                    Some(dup) => {
                        let reason = format!("duplicate wishlist entry for {dup}");
                        self.replace(Vec::new());
                        restore::degrade("wishlist", &reason)
                    }
                    None => {
                        let count = entries.len();
                        self.replace(entries);
                        RestoreStatus::Restored { entries: count }
                    }
                }
            }
            Err(e) => {
                self.replace(Vec::new());
                restore::degrade("wishlist", &e)
            }
        };
        tracing::debug!(?status, "wishlist restored");
        status
    }

    /// Saves `product` unless it is already saved.
    ///
    /// A second toggle of a saved product does not remove it; it reports
    /// `AlreadyPresent` and leaves the wishlist untouched.
    pub fn toggle(&self, product: &Product) -> WishlistOutcome {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let outcome = if entries.iter().any(|e| e.product_id() == &product.id) {
            WishlistOutcome::AlreadyPresent
        } else {
            entries.push(WishlistEntry {
                product: product.clone(),
                added_at: Utc::now(),
            });
            self.persist(&entries);
            WishlistOutcome::Added
        };

        metrics::counter!("wishlist_toggles_total", "outcome" => outcome.as_str()).increment(1);
        tracing::debug!(product_id = %product.id, outcome = outcome.as_str(), "wishlist toggle");
        outcome
    }

    /// Removes a saved product. Returns false if it was not saved.
    pub fn remove(&self, product_id: &ProductId) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|e| e.product_id() != product_id);
        let removed = entries.len() != before;
        if removed {
            self.persist(&entries);
        }
        removed
    }

    /// Returns true if the product is saved.
    pub fn is_present(&self, product_id: &ProductId) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|e| e.product_id() == product_id)
    }

    /// Returns the saved entry for a product.
    pub fn entry(&self, product_id: &ProductId) -> Option<WishlistEntry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|e| e.product_id() == product_id)
            .cloned()
    }

    /// Returns the read view.
    pub fn view(&self) -> WishlistView {
        WishlistView {
            entries: self
                .entries
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        }
    }

    /// Returns the number of saved products.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if nothing is saved.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Empties the wishlist without touching persisted state.
    pub(crate) fn reset(&self) {
        self.replace(Vec::new());
    }

    /// Writes the current entries under the active identity.
    pub(crate) fn persist_current(&self) {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        self.persist(&entries);
    }

    fn persist(&self, entries: &[WishlistEntry]) {
        if let Err(e) = self.persistence.save_section(WISHLIST_SECTION, &entries) {
            tracing::warn!(error = %e, "failed to persist wishlist");
        }
    }

    fn replace(&self, entries: Vec<WishlistEntry>) {
        *self.entries.write().unwrap_or_else(PoisonError::into_inner) = entries;
    }
}
