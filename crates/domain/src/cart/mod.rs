//! Shopping cart: line items, derived totals and the owning store.

mod line_item;
mod store;
mod totals;

pub use line_item::CartLineItem;
pub use store::{CART_SECTION, CartConfig, CartStore, CartView, DEFAULT_MAX_LINE_QUANTITY};
pub use totals::CartTotals;
