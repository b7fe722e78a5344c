//! Domain layer for the storefront session core.
//!
//! This crate provides:
//! - `CartStore`, the sole owner and mutator of cart line items
//! - `WishlistStore`, a deduplicated set of saved products
//! - `SessionBridge`, which rescopes both stores on login and logout
//! - the `ProductCatalog` and `AuthSession` collaborator seams

pub mod cart;
pub mod error;
pub mod product;
pub mod restore;
pub mod session;
pub mod wishlist;

pub use cart::{
    CART_SECTION, CartConfig, CartLineItem, CartStore, CartTotals, CartView,
    DEFAULT_MAX_LINE_QUANTITY,
};
pub use error::{CartError, CatalogError};
pub use product::{InMemoryCatalog, Product, ProductCatalog};
pub use restore::RestoreStatus;
pub use session::{
    AuthEvent, AuthSession, InMemoryAuthSession, SessionBridge, SessionStart, UserProfile,
};
pub use wishlist::{WISHLIST_SECTION, WishlistEntry, WishlistOutcome, WishlistStore, WishlistView};
