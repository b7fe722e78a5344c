//! Payment gateway loader trait and in-memory implementation.
//!
//! Only the availability of the payment resource matters to checkout;
//! settlement happens outside this system.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors returned while loading the payment resource.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("failed to load payment resource: {0}")]
    LoadFailed(String),
}

/// Trait for making the payment resource available.
#[async_trait]
pub trait PaymentGatewayLoader: Send + Sync {
    /// Loads the payment resource if needed.
    async fn ensure_available(&self) -> Result<(), GatewayError>;
}

#[async_trait]
impl<T: PaymentGatewayLoader + ?Sized> PaymentGatewayLoader for Arc<T> {
    async fn ensure_available(&self) -> Result<(), GatewayError> {
        (**self).ensure_available().await
    }
}

#[derive(Debug, Default)]
struct InMemoryGatewayState {
    loads: usize,
    fail_on_load: bool,
    delay: Duration,
}

/// In-memory gateway loader for testing and the demo storefront.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGatewayLoader {
    state: Arc<RwLock<InMemoryGatewayState>>,
}

impl InMemoryGatewayLoader {
    /// Creates a loader that always succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the loader to fail.
    pub fn set_fail_on_load(&self, fail: bool) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .fail_on_load = fail;
    }

    /// Makes every load wait `delay` before answering.
    pub fn set_delay(&self, delay: Duration) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .delay = delay;
    }

    /// Returns how many loads were attempted.
    pub fn load_count(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .loads
    }
}

#[async_trait]
impl PaymentGatewayLoader for InMemoryGatewayLoader {
    async fn ensure_available(&self) -> Result<(), GatewayError> {
        let (delay, fail) = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            state.loads += 1;
            (state.delay, state.fail_on_load)
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(GatewayError::LoadFailed(
                "payment script did not load".to_string(),
            ));
        }
        Ok(())
    }
}
