//! External collaborators consumed by checkout, with in-memory implementations.

pub mod gateway;
pub mod order_backend;

pub use gateway::{GatewayError, InMemoryGatewayLoader, PaymentGatewayLoader};
pub use order_backend::{BackendError, InMemoryOrderBackend, OrderBackend};
