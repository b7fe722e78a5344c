//! Checkout step machine.

use serde::{Deserialize, Serialize};

/// The step a checkout is on.
///
/// Step transitions:
/// ```text
/// Address ──► Payment ──► Confirmation
///    ▲           │
///    └── edit ───┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CheckoutStep {
    /// Collecting the shipping address.
    #[default]
    Address,

    /// Choosing a payment method and placing the order.
    Payment,

    /// The order was placed (terminal state).
    Confirmation,
}

impl CheckoutStep {
    /// Returns true if an address can be submitted.
    pub fn can_advance_address(&self) -> bool {
        matches!(self, CheckoutStep::Address)
    }

    /// Returns true if the payment method can be changed.
    pub fn can_choose_payment(&self) -> bool {
        matches!(self, CheckoutStep::Address | CheckoutStep::Payment)
    }

    /// Returns true if the shopper can go back to edit the address.
    pub fn can_edit_address(&self) -> bool {
        matches!(self, CheckoutStep::Payment)
    }

    /// Returns true if an order can be submitted.
    pub fn can_submit(&self) -> bool {
        matches!(self, CheckoutStep::Payment)
    }

    /// Returns true if this is a terminal step.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CheckoutStep::Confirmation)
    }

    /// Returns the step name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutStep::Address => "Address",
            CheckoutStep::Payment => "Payment",
            CheckoutStep::Confirmation => "Confirmation",
        }
    }
}

impl std::fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_step_is_address() {
        assert_eq!(CheckoutStep::default(), CheckoutStep::Address);
    }

    #[test]
    fn test_can_submit() {
        assert!(!CheckoutStep::Address.can_submit());
        assert!(CheckoutStep::Payment.can_submit());
        assert!(!CheckoutStep::Confirmation.can_submit());
    }

    #[test]
    fn test_can_choose_payment() {
        assert!(CheckoutStep::Address.can_choose_payment());
        assert!(CheckoutStep::Payment.can_choose_payment());
        assert!(!CheckoutStep::Confirmation.can_choose_payment());
    }

    #[test]
    fn test_edit_only_from_payment() {
        assert!(!CheckoutStep::Address.can_edit_address());
        assert!(CheckoutStep::Payment.can_edit_address());
        assert!(!CheckoutStep::Confirmation.can_edit_address());
    }

    #[test]
    fn test_terminal_steps() {
        assert!(!CheckoutStep::Address.is_terminal());
        assert!(!CheckoutStep::Payment.is_terminal());
        assert!(CheckoutStep::Confirmation.is_terminal());
    }

    #[test]
    fn test_display() {
        assert_eq!(CheckoutStep::Address.to_string(), "Address");
        assert_eq!(CheckoutStep::Payment.to_string(), "Payment");
        assert_eq!(CheckoutStep::Confirmation.to_string(), "Confirmation");
    }

    #[test]
    fn test_serialization() {
        let step = CheckoutStep::Payment;
        let json = serde_json::to_string(&step).unwrap();
        let deserialized: CheckoutStep = serde_json::from_str(&json).unwrap();
        assert_eq!(step, deserialized);
    }
}
