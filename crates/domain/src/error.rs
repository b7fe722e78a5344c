//! Domain error types.

use common::ProductId;
use thiserror::Error;

/// Errors that can occur during cart operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// The product cannot be put in a cart (missing or inconsistent pricing,
    /// unknown id, out of stock). The cart is left unchanged.
    #[error("Invalid product {product_id}: {reason}")]
    InvalidProduct {
        product_id: ProductId,
        reason: String,
    },

    /// Quantities added to a cart must be at least one.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },
}

impl CartError {
    /// Builds an `InvalidProduct` error for `product_id`.
    pub fn invalid_product(product_id: &ProductId, reason: impl Into<String>) -> Self {
        CartError::InvalidProduct {
            product_id: product_id.clone(),
            reason: reason.into(),
        }
    }
}

/// Errors reported by a product catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// The catalog could not be reached.
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),
}
