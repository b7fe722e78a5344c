//! Payment method and order records exchanged with the order backend.

use chrono::{DateTime, Utc};
use common::SessionIdentity;
use domain::{CartLineItem, CartTotals};
use serde::{Deserialize, Serialize};

use crate::address::ShippingAddress;

/// How the shopper pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentMethod {
    /// Online payment through the external gateway.
    #[default]
    Gateway,

    /// Cash on delivery.
    CashOnDelivery,
}

impl PaymentMethod {
    /// Returns the method name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Gateway => "gateway",
            PaymentMethod::CashOnDelivery => "cod",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gateway" | "online" => Ok(PaymentMethod::Gateway),
            "cod" | "cash" => Ok(PaymentMethod::CashOnDelivery),
            other => Err(format!("unknown payment method '{other}'")),
        }
    }
}

/// Identifier the order backend assigns to a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything the order backend needs to place an order.
///
/// Built once when submission starts; later cart edits do not reach it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRequest {
    pub identity: SessionIdentity,
    pub items: Vec<CartLineItem>,
    pub address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub totals: CartTotals,
}

/// An order as recorded by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacedOrder {
    pub id: OrderId,
    pub identity: SessionIdentity,
    pub items: Vec<CartLineItem>,
    pub address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub totals: CartTotals,
    pub placed_at: DateTime<Utc>,
}

impl PlacedOrder {
    /// Records `request` under `id`, placed now.
    pub fn new(id: OrderId, request: OrderRequest) -> Self {
        Self {
            id,
            identity: request.identity,
            items: request.items,
            address: request.address,
            payment_method: request.payment_method,
            totals: request.totals,
            placed_at: Utc::now(),
        }
    }
}
