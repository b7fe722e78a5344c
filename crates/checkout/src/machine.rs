//! Checkout state machine driving Address → Payment → Confirmation.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use common::SessionIdentity;
use domain::{CartStore, CartTotals, CartView, UserProfile};
use serde::Serialize;

use crate::address::ShippingAddress;
use crate::error::CheckoutError;
use crate::order::{OrderId, OrderRequest, PaymentMethod};
use crate::services::{OrderBackend, PaymentGatewayLoader};
use crate::state::CheckoutStep;

/// Default time allowed for loading the payment resource.
pub const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(10);

/// Default time allowed for the order backend to answer.
pub const DEFAULT_SUBMIT_TIMEOUT: Duration = Duration::from_secs(15);

/// Checkout timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutConfig {
    pub gateway_timeout: Duration,
    pub submit_timeout: Duration,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            gateway_timeout: DEFAULT_GATEWAY_TIMEOUT,
            submit_timeout: DEFAULT_SUBMIT_TIMEOUT,
        }
    }
}

/// What checkout needs from the cart: a read snapshot and a one-way clear.
pub trait CartSource: Send + Sync {
    /// Returns the cart as it is right now.
    fn snapshot(&self) -> CartView;

    /// Empties the cart after an order was placed.
    fn clear_after_order(&self);
}

impl CartSource for CartStore {
    fn snapshot(&self) -> CartView {
        self.view()
    }

    fn clear_after_order(&self) {
        self.clear();
    }
}

/// Read view of the checkout handed to the UI layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutView {
    pub step: CheckoutStep,
    pub address: ShippingAddress,
    pub payment_method: PaymentMethod,
    #[serde(skip)]
    pub last_error: Option<CheckoutError>,
    pub order_id: Option<OrderId>,
    /// Totals captured when the pending or last submission started.
    pub totals: Option<CartTotals>,
    pub submitting: bool,
}

#[derive(Debug, Default)]
struct CheckoutSession {
    step: CheckoutStep,
    address: ShippingAddress,
    payment_method: PaymentMethod,
    last_error: Option<CheckoutError>,
    order_id: Option<OrderId>,
    totals: Option<CartTotals>,
    in_flight: bool,
    generation: u64,
    /// Generation whose order is with the backend. Survives `abandon`, since
    /// the backend may still place that order.
    backend_call: Option<u64>,
}

impl CheckoutSession {
    fn submission_pending(&self) -> bool {
        self.in_flight || self.backend_call.is_some()
    }

    fn release_backend_call(&mut self, generation: u64) {
        if self.backend_call == Some(generation) {
            self.backend_call = None;
        }
    }
}

/// Drives one shopper's checkout.
///
/// All transitions take `&self`; the session state sits behind a mutex that
/// is never held across an await. `submit` is the only suspending
/// operation. At most one submission is in flight at a time, and a
/// submission whose flow was abandoned meanwhile is discarded.
pub struct CheckoutStateMachine<C, B, G>
where
    C: CartSource,
    B: OrderBackend,
    G: PaymentGatewayLoader,
{
    cart: C,
    backend: B,
    gateway: G,
    identity: SessionIdentity,
    config: CheckoutConfig,
    session: Mutex<CheckoutSession>,
}

impl<C, B, G> CheckoutStateMachine<C, B, G>
where
    C: CartSource,
    B: OrderBackend,
    G: PaymentGatewayLoader,
{
    /// Creates a machine on the `Address` step for `identity`.
    pub fn new(
        cart: C,
        backend: B,
        gateway: G,
        identity: SessionIdentity,
        config: CheckoutConfig,
    ) -> Self {
        Self {
            cart,
            backend,
            gateway,
            identity,
            config,
            session: Mutex::new(CheckoutSession::default()),
        }
    }

    /// Pre-fills the name and phone fields from a signed-in profile.
    ///
    /// Only empty fields are filled in.
    pub fn prefill(&self, profile: &UserProfile) {
        let mut session = self.lock();
        if session.address.full_name.is_empty() {
            session.address.full_name = profile.name.clone();
        }
        if session.address.phone.is_empty() {
            if let Some(phone) = &profile.phone {
                session.address.phone = phone.clone();
            }
        }
    }

    /// Returns the identity orders are placed for.
    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    /// Returns the current step.
    pub fn current_step(&self) -> CheckoutStep {
        self.lock().step
    }

    /// Returns the read view.
    pub fn view(&self) -> CheckoutView {
        let session = self.lock();
        CheckoutView {
            step: session.step,
            address: session.address.clone(),
            payment_method: session.payment_method,
            last_error: session.last_error.clone(),
            order_id: session.order_id.clone(),
            totals: session.totals,
            submitting: session.submission_pending(),
        }
    }

    /// Returns true while a submission runs or an abandoned one still waits
    /// on the backend.
    pub fn submission_pending(&self) -> bool {
        self.lock().submission_pending()
    }

    /// Submits the shipping address and moves to `Payment`.
    ///
    /// The address is kept even when it is incomplete, so the shopper can
    /// fix the named fields without retyping the rest.
    pub fn advance_address(&self, address: ShippingAddress) -> Result<(), CheckoutError> {
        let mut session = self.lock();
        if !session.step.can_advance_address() {
            return Err(invalid_step(session.step, "submit an address"));
        }

        session.address = address;
        if let Err(e) = session.address.validate() {
            tracing::debug!(error = %e, "address rejected");
            session.last_error = Some(e.clone());
            return Err(e);
        }

        session.step = CheckoutStep::Payment;
        session.last_error = None;
        tracing::info!(step = %session.step, "checkout advanced");
        Ok(())
    }

    /// Chooses the payment method.
    pub fn set_payment_method(&self, method: PaymentMethod) -> Result<(), CheckoutError> {
        let mut session = self.lock();
        if session.in_flight {
            return Err(CheckoutError::SubmissionInProgress);
        }
        if !session.step.can_choose_payment() {
            return Err(invalid_step(session.step, "change the payment method"));
        }
        session.payment_method = method;
        tracing::debug!(%method, "payment method chosen");
        Ok(())
    }

    /// Returns from `Payment` to `Address`, keeping the entered address.
    pub fn edit_address(&self) -> Result<(), CheckoutError> {
        let mut session = self.lock();
        if session.in_flight {
            return Err(CheckoutError::SubmissionInProgress);
        }
        if !session.step.can_edit_address() {
            return Err(invalid_step(session.step, "edit the address"));
        }
        session.step = CheckoutStep::Address;
        session.last_error = None;
        tracing::info!(step = %session.step, "checkout returned to address");
        Ok(())
    }

    /// Leaves the flow without placing an order.
    ///
    /// A pending submission keeps running but its result is discarded. The
    /// cart is not touched. Does nothing once the order is confirmed.
    ///
    /// If the abandoned submission already reached the backend, new
    /// submissions are refused until that call returns.
    pub fn abandon(&self) {
        let mut session = self.lock();
        if session.step.is_terminal() {
            return;
        }
        let was_submitting = session.in_flight;
        session.generation += 1;
        session.in_flight = false;
        session.step = CheckoutStep::Address;
        session.totals = None;
        session.last_error = None;
        tracing::info!(was_submitting, "checkout abandoned");
    }

    /// Places the order.
    ///
    /// Captures the cart totals, makes sure the payment resource is
    /// available, then hands the order to the backend. On success the cart
    /// is cleared and the machine moves to `Confirmation`. On any failure
    /// the machine stays on `Payment` with the cart intact.
    #[tracing::instrument(skip(self), fields(identity = %self.identity))]
    pub async fn submit(&self) -> Result<OrderId, CheckoutError> {
        let (generation, request) = self.begin_submission()?;
        let _in_flight = InFlightGuard {
            session: &self.session,
            generation,
        };
        metrics::counter!("checkout_submissions_total", "outcome" => "started").increment(1);
        let started = Instant::now();

        let result = self.place(generation, request).await;
        let result = self.finish(generation, result);

        let outcome = match &result {
            Ok(_) => "placed",
            Err(e) => e.kind(),
        };
        metrics::counter!("checkout_submissions_total", "outcome" => outcome).increment(1);
        metrics::histogram!("checkout_submit_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        result
    }

    /// Checks the guards and captures the order request.
    fn begin_submission(&self) -> Result<(u64, OrderRequest), CheckoutError> {
        let mut session = self.lock();
        if session.submission_pending() {
            tracing::debug!(
                orphaned = !session.in_flight,
                "submission rejected, one is already pending"
            );
            return Err(CheckoutError::SubmissionInProgress);
        }
        if !session.step.can_submit() {
            return Err(invalid_step(session.step, "submit an order"));
        }

        let cart = self.cart.snapshot();
        if cart.is_empty() {
            session.last_error = Some(CheckoutError::EmptyCart);
            return Err(CheckoutError::EmptyCart);
        }

        let totals = cart.totals();
        session.in_flight = true;
        session.totals = Some(totals);
        session.last_error = None;

        let request = OrderRequest {
            identity: self.identity.clone(),
            items: cart.items,
            address: session.address.clone(),
            payment_method: session.payment_method,
            totals,
        };
        Ok((session.generation, request))
    }

    async fn place(&self, generation: u64, request: OrderRequest) -> Result<OrderId, CheckoutError> {
        match tokio::time::timeout(self.config.gateway_timeout, self.gateway.ensure_available())
            .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "payment gateway unavailable");
                return Err(CheckoutError::GatewayUnavailable(e.to_string()));
            }
            Err(_) => {
                tracing::warn!(timeout = ?self.config.gateway_timeout, "payment gateway load timed out");
                return Err(CheckoutError::GatewayUnavailable(format!(
                    "timed out after {:?}",
                    self.config.gateway_timeout
                )));
            }
        }

        self.claim_backend_call(generation)?;

        match tokio::time::timeout(
            self.config.submit_timeout,
            self.backend.submit_order(request),
        )
        .await
        {
            Ok(Ok(order_id)) => Ok(order_id),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "order backend rejected submission");
                Err(CheckoutError::SubmissionFailure(e.to_string()))
            }
            Err(_) => {
                tracing::warn!(timeout = ?self.config.submit_timeout, "order submission timed out");
                Err(CheckoutError::SubmissionFailure(format!(
                    "timed out after {:?}",
                    self.config.submit_timeout
                )))
            }
        }
    }

    /// Applies a submission's result unless the flow moved on meanwhile.
    fn finish(
        &self,
        generation: u64,
        result: Result<OrderId, CheckoutError>,
    ) -> Result<OrderId, CheckoutError> {
        let mut session = self.lock();
        session.release_backend_call(generation);
        if session.generation != generation || !session.step.can_submit() {
            tracing::warn!(?result, "discarding stale submission result");
            return Err(CheckoutError::Stale);
        }
        session.in_flight = false;

        match result {
            Ok(order_id) => {
                self.cart.clear_after_order();
                session.order_id = Some(order_id.clone());
                session.step = CheckoutStep::Confirmation;
                session.last_error = None;
                tracing::info!(%order_id, "order placed");
                Ok(order_id)
            }
            Err(e) => {
                session.last_error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Marks the backend call as started, unless the flow moved on while
    /// the gateway loaded.
    fn claim_backend_call(&self, generation: u64) -> Result<(), CheckoutError> {
        let mut session = self.lock();
        if session.generation != generation {
            return Err(CheckoutError::Stale);
        }
        session.backend_call = Some(generation);
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, CheckoutSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C, B, G> std::fmt::Debug for CheckoutStateMachine<C, B, G>
where
    C: CartSource,
    B: OrderBackend,
    G: PaymentGatewayLoader,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutStateMachine")
            .field("identity", &self.identity)
            .field("config", &self.config)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

/// Clears the in-flight flag and the backend marker if a submission future
/// is dropped mid-way.
struct InFlightGuard<'a> {
    session: &'a Mutex<CheckoutSession>,
    generation: u64,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        session.release_backend_call(self.generation);
        if session.generation == self.generation {
            session.in_flight = false;
        }
    }
}

fn invalid_step(step: CheckoutStep, action: &'static str) -> CheckoutError {
    CheckoutError::InvalidStep { step, action }
}
