use common::Money;
use serde::{Deserialize, Serialize};

use super::CartLineItem;

/// Totals derived from a set of cart lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CartTotals {
    /// Sum of quantities.
    pub count: u32,

    /// Sum of `unit_price * quantity`.
    pub total: Money,

    /// Sum of `(original_unit_price - unit_price) * quantity`.
    pub savings: Money,
}

impl CartTotals {
    /// Computes totals for `items`.
    pub fn of(items: &[CartLineItem]) -> Self {
        Self {
            count: items.iter().map(|line| line.quantity).sum(),
            total: items.iter().map(CartLineItem::line_total).sum(),
            savings: items.iter().map(CartLineItem::line_savings).sum(),
        }
    }

    /// Returns true if the totals of `items` stay representable with every
    /// line at any quantity up to `max_quantity`.
    ///
    /// Assumes each line passed [`CartLineItem::check`], so the pre-discount
    /// total bounds both `total` and `savings`.
    pub fn fit_within(items: &[CartLineItem], max_quantity: u32) -> bool {
        items
            .iter()
            .try_fold(Money::zero(), |sum, line| {
                line.original_unit_price
                    .checked_multiply(max_quantity)
                    .and_then(|line_max| sum.checked_add(line_max))
            })
            .is_some()
    }

    /// Returns the pre-discount total (`total + savings`).
    pub fn original_total(&self) -> Money {
        self.total + self.savings
    }
}
