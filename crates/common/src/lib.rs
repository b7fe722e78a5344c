//! Shared types for the storefront session core.

pub mod types;

pub use types::{Money, ProductId, SessionIdentity, UserId};
