use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use common::{Money, ProductId};
use persistence::PersistenceAdapter;
use serde::Serialize;

use super::{CartLineItem, CartTotals};
use crate::error::CartError;
use crate::product::Product;
use crate::restore::{self, RestoreStatus};

/// Snapshot section the cart is persisted under.
pub const CART_SECTION: &str = "cart";

/// Default per-line quantity cap.
pub const DEFAULT_MAX_LINE_QUANTITY: u32 = 10;

/// Cart tuning knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartConfig {
    /// Largest quantity a single line may hold. Additions beyond it are capped.
    pub max_line_quantity: u32,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            max_line_quantity: DEFAULT_MAX_LINE_QUANTITY,
        }
    }
}

/// Read view of the cart handed to the UI layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartView {
    pub items: Vec<CartLineItem>,
    pub count: u32,
    pub total: Money,
    pub savings: Money,
}

impl CartView {
    fn of(items: Vec<CartLineItem>) -> Self {
        let totals = CartTotals::of(&items);
        Self {
            items,
            count: totals.count,
            total: totals.total,
            savings: totals.savings,
        }
    }

    /// Returns the derived totals.
    pub fn totals(&self) -> CartTotals {
        CartTotals {
            count: self.count,
            total: self.total,
            savings: self.savings,
        }
    }

    /// Returns true if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Owner of the cart's line items.
///
/// All cart mutations go through this store; every mutation writes the full
/// line list through the persistence adapter before returning. Clones are
/// handles onto the same cart.
#[derive(Debug, Clone)]
pub struct CartStore {
    lines: Arc<RwLock<Vec<CartLineItem>>>,
    persistence: PersistenceAdapter,
    config: CartConfig,
}

impl CartStore {
    /// Creates an empty cart writing through `persistence`.
    pub fn new(persistence: PersistenceAdapter, config: CartConfig) -> Self {
        Self {
            lines: Arc::new(RwLock::new(Vec::new())),
            persistence,
            config,
        }
    }

    /// Returns the cart configuration.
    pub fn config(&self) -> CartConfig {
        self.config
    }

    /// Replaces the in-memory cart with the active identity's persisted cart.
    ///
    /// Unreadable or invariant-breaking data leaves the cart empty.
    pub fn restore(&self) -> RestoreStatus {
        let loaded = restore::load_section::<Vec<CartLineItem>>(&self.persistence, CART_SECTION);
        let status = match loaded {
            Ok(None) => {
                self.replace(Vec::new());
                RestoreStatus::Empty
            }
            Ok(Some(lines)) => match self.validate_restored(lines) {
                Ok(lines) => {
                    let entries = lines.len();
                    self.replace(lines);
                    RestoreStatus::Restored { entries }
                }
                Err(reason) => {
                    self.replace(Vec::new());
                    restore::degrade("cart", &reason)
                }
            },
            Err(e) => {
                self.replace(Vec::new());
                restore::degrade("cart", &e)
            }
        };
        tracing::debug!(?status, "cart restored");
        status
    }

    /// Adds `quantity` units of `product`.
    ///
    /// An existing line for the same product has its quantity increased
    /// (capped at the configured maximum); otherwise a new line is appended.
    /// Returns the resulting line.
    pub fn add_item(&self, product: &Product, quantity: u32) -> Result<CartLineItem, CartError> {
        let incoming = CartLineItem::from_product(product, quantity)?;
        let max = self.config.max_line_quantity;

        let line = self.mutate("add", |lines| {
            let before = lines.clone();
            let line = match lines
                .iter_mut()
                .find(|line| line.product_id == incoming.product_id)
            {
                Some(existing) => {
                    let merged = existing.quantity.saturating_add(quantity);
                    if merged > max {
                        tracing::debug!(product_id = %existing.product_id, merged, max, "line quantity capped");
                    }
                    existing.quantity = merged.min(max);
                    existing.clone()
                }
                None => {
                    let mut line = incoming;
                    line.quantity = line.quantity.min(max);
                    lines.push(line.clone());
                    line
                }
            };
            if !CartTotals::fit_within(lines, max) {
                *lines = before;
                return (
                    Err(CartError::invalid_product(
                        &line.product_id,
                        "price too large for the cart total",
                    )),
                    false,
                );
            }
            (Ok(line), true)
        })?;

        tracing::debug!(product_id = %line.product_id, quantity = line.quantity, "item added to cart");
        Ok(line)
    }

    /// Sets a line's quantity. Zero removes the line.
    ///
    /// Returns false (and does nothing) if the product is not in the cart.
    pub fn set_quantity(&self, product_id: &ProductId, quantity: u32) -> bool {
        let max = self.config.max_line_quantity;
        self.mutate("set_quantity", |lines| {
            let Some(index) = lines.iter().position(|l| &l.product_id == product_id) else {
                return (false, false);
            };
            if quantity == 0 {
                lines.remove(index);
                return (true, true);
            }
            let line = &mut lines[index];
            let capped = quantity.min(max);
            let changed = line.quantity != capped;
            line.quantity = capped;
            (true, changed)
        })
    }

    /// Removes a line. Returns false if the product was not in the cart.
    pub fn remove_item(&self, product_id: &ProductId) -> bool {
        self.mutate("remove", |lines| {
            let before = lines.len();
            lines.retain(|l| &l.product_id != product_id);
            let removed = lines.len() != before;
            (removed, removed)
        })
    }

    /// Empties the cart and persists the empty cart.
    pub fn clear(&self) {
        self.mutate("clear", |lines| {
            let changed = !lines.is_empty();
            lines.clear();
            ((), changed)
        });
        tracing::debug!("cart cleared");
    }

    /// Empties the cart without touching persisted state.
    pub(crate) fn reset(&self) {
        self.replace(Vec::new());
    }

    /// Writes the current lines under the active identity.
    pub(crate) fn persist_current(&self) {
        let lines = self.lines.read().unwrap_or_else(PoisonError::into_inner);
        self.persist(&lines);
    }

    /// Returns the read view (lines plus freshly derived totals).
    pub fn view(&self) -> CartView {
        CartView::of(self.items())
    }

    /// Returns a copy of the lines in insertion order.
    pub fn items(&self) -> Vec<CartLineItem> {
        self.lines
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the line for a product.
    pub fn line(&self, product_id: &ProductId) -> Option<CartLineItem> {
        self.lines
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|l| &l.product_id == product_id)
            .cloned()
    }

    /// Returns the derived totals.
    pub fn totals(&self) -> CartTotals {
        CartTotals::of(&self.lines.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Returns the total number of units.
    pub fn count(&self) -> u32 {
        self.totals().count
    }

    /// Returns the amount payable.
    pub fn total(&self) -> Money {
        self.totals().total
    }

    /// Returns the discount against original prices.
    pub fn savings(&self) -> Money {
        self.totals().savings
    }

    /// Returns true if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    fn mutate<R>(
        &self,
        op: &'static str,
        f: impl FnOnce(&mut Vec<CartLineItem>) -> (R, bool),
    ) -> R {
        let mut lines = self.lines.write().unwrap_or_else(PoisonError::into_inner);
        let (result, changed) = f(&mut lines);
        if changed {
            metrics::counter!("cart_mutations_total", "op" => op).increment(1);
            self.persist(&lines);
        }
        result
    }

    fn persist(&self, lines: &[CartLineItem]) {
        if let Err(e) = self.persistence.save_section(CART_SECTION, &lines) {
            tracing::warn!(error = %e, "failed to persist cart");
        }
    }

    fn replace(&self, lines: Vec<CartLineItem>) {
        *self.lines.write().unwrap_or_else(PoisonError::into_inner) = lines;
    }

    fn validate_restored(&self, mut lines: Vec<CartLineItem>) -> Result<Vec<CartLineItem>, String> {
        let mut seen = HashSet::new();
        for line in &mut lines {
            line.check()?;
            if !seen.insert(line.product_id.clone()) {
                return Err(format!("duplicate line for {}", line.product_id));
            }
            line.quantity = line.quantity.min(self.config.max_line_quantity);
        }
        if !CartTotals::fit_within(&lines, self.config.max_line_quantity) {
            return Err("cart totals overflow".to_string());
        }
        Ok(lines)
    }
}
