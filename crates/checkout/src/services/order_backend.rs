//! Order backend trait and in-memory implementation.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use common::SessionIdentity;
use thiserror::Error;

use crate::order::{OrderId, OrderRequest, PlacedOrder};

/// Errors returned by an order backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The backend refused the order.
    #[error("order rejected: {0}")]
    Rejected(String),

    /// The backend could not be reached.
    #[error("order backend unavailable: {0}")]
    Unavailable(String),
}

/// Trait for placing orders.
#[async_trait]
pub trait OrderBackend: Send + Sync {
    /// Places an order and returns the id the backend assigned to it.
    async fn submit_order(&self, request: OrderRequest) -> Result<OrderId, BackendError>;
}

#[async_trait]
impl<T: OrderBackend + ?Sized> OrderBackend for Arc<T> {
    async fn submit_order(&self, request: OrderRequest) -> Result<OrderId, BackendError> {
        (**self).submit_order(request).await
    }
}

#[derive(Debug, Default)]
struct InMemoryOrderState {
    orders: Vec<PlacedOrder>,
    next_id: u32,
    submit_calls: usize,
    fail_on_submit: bool,
    delay: Duration,
}

/// In-memory order backend, also used as the demo storefront's backend.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderBackend {
    state: Arc<RwLock<InMemoryOrderState>>,
}

impl InMemoryOrderBackend {
    /// Creates a new in-memory order backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to reject submissions.
    pub fn set_fail_on_submit(&self, fail: bool) {
        self.write().fail_on_submit = fail;
    }

    /// Makes every submission wait `delay` before answering.
    pub fn set_delay(&self, delay: Duration) {
        self.write().delay = delay;
    }

    /// Returns how many times `submit_order` was called.
    pub fn submit_count(&self) -> usize {
        self.read().submit_calls
    }

    /// Returns every placed order, oldest first.
    pub fn orders(&self) -> Vec<PlacedOrder> {
        self.read().orders.clone()
    }

    /// Returns the orders placed by `identity`, oldest first.
    pub fn orders_for(&self, identity: &SessionIdentity) -> Vec<PlacedOrder> {
        self.read()
            .orders
            .iter()
            .filter(|o| &o.identity == identity)
            .cloned()
            .collect()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, InMemoryOrderState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, InMemoryOrderState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl OrderBackend for InMemoryOrderBackend {
    async fn submit_order(&self, request: OrderRequest) -> Result<OrderId, BackendError> {
        let delay = {
            let mut state = self.write();
            state.submit_calls += 1;
            state.delay
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.write();
        if state.fail_on_submit {
            return Err(BackendError::Rejected("Order could not be placed".to_string()));
        }

        state.next_id += 1;
        let order_id = OrderId::new(format!("ORD-{:04}", state.next_id));
        state
            .orders
            .push(PlacedOrder::new(order_id.clone(), request));
        tracing::info!(%order_id, "order recorded");

        Ok(order_id)
    }
}
