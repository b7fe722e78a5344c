//! Storefront error types.

use checkout::CheckoutError;
use common::ProductId;
use domain::{CartError, CatalogError};
use persistence::PersistenceError;
use thiserror::Error;

/// Errors surfaced to the shopper by the storefront.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// Checkout needs a signed-in user.
    #[error("Please log in to check out")]
    NotAuthenticated,

    /// The product is not on the wishlist.
    #[error("Product {0} is not on the wishlist")]
    NotInWishlist(ProductId),

    /// No checkout has been started.
    #[error("No checkout in progress")]
    NoCheckout,

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error("Storage error: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Convenience type alias for storefront results.
pub type Result<T> = std::result::Result<T, StorefrontError>;
