//! Checkout error types.

use thiserror::Error;

use crate::address::AddressField;
use crate::state::CheckoutStep;

/// Errors surfaced by the checkout flow.
///
/// Every variant is recoverable: the machine stays on its current step and
/// keeps the error in its read view for the UI to display.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    /// One or more required address fields are empty.
    #[error("Missing required address fields: {}", AddressField::join(.missing))]
    Validation { missing: Vec<AddressField> },

    /// The payment resource could not be loaded.
    #[error("Payment gateway unavailable: {0}")]
    GatewayUnavailable(String),

    /// The order backend rejected or did not answer the submission.
    #[error("Order submission failed: {0}")]
    SubmissionFailure(String),

    /// A submission is already pending.
    #[error("An order submission is already in progress")]
    SubmissionInProgress,

    /// The cart has no lines to order.
    #[error("Cannot place an order with an empty cart")]
    EmptyCart,

    /// The operation is not allowed on the current step.
    #[error("Cannot {action} during the {step} step")]
    InvalidStep {
        step: CheckoutStep,
        action: &'static str,
    },

    /// The flow was abandoned before the submission finished.
    #[error("Checkout was abandoned before the submission completed")]
    Stale,
}

impl CheckoutError {
    /// Returns the metrics label for this error.
    pub fn kind(&self) -> &'static str {
        match self {
            CheckoutError::Validation { .. } => "validation",
            CheckoutError::GatewayUnavailable(_) => "gateway_unavailable",
            CheckoutError::SubmissionFailure(_) => "submission_failure",
            CheckoutError::SubmissionInProgress => "in_progress",
            CheckoutError::EmptyCart => "empty_cart",
            CheckoutError::InvalidStep { .. } => "invalid_step",
            CheckoutError::Stale => "stale",
        }
    }
}
