//! Checkout flow for the storefront session core.
//!
//! The flow has three steps:
//! 1. Address: collect and validate the shipping address
//! 2. Payment: choose a payment method and submit the order
//! 3. Confirmation: the order was placed and the cart cleared
//!
//! Submission is the only asynchronous step. It is guarded so at most one
//! order is in flight, and bounded by timeouts on both collaborators.

pub mod address;
pub mod error;
pub mod machine;
pub mod order;
pub mod services;
pub mod state;

pub use address::{AddressField, ShippingAddress};
pub use error::CheckoutError;
pub use machine::{
    CartSource, CheckoutConfig, CheckoutStateMachine, CheckoutView, DEFAULT_GATEWAY_TIMEOUT,
    DEFAULT_SUBMIT_TIMEOUT,
};
pub use order::{OrderId, OrderRequest, PaymentMethod, PlacedOrder};
pub use services::{
    BackendError, GatewayError, InMemoryGatewayLoader, InMemoryOrderBackend, OrderBackend,
    PaymentGatewayLoader,
};
pub use state::CheckoutStep;
