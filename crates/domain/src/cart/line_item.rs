use common::{Money, ProductId};
use serde::{Deserialize, Serialize};

use crate::error::CartError;
use crate::product::Product;

/// One product and quantity in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Money,
    pub original_unit_price: Money,
    pub discount_percent: u8,
    pub quantity: u32,
    pub image_ref: String,
    pub category_ref: String,
}

impl CartLineItem {
    /// Builds a line from a catalog product.
    ///
    /// Fails with `InvalidProduct` if the product cannot be priced and with
    /// `InvalidQuantity` if `quantity` is zero.
    pub fn from_product(product: &Product, quantity: u32) -> Result<Self, CartError> {
        let (unit_price, original_unit_price) = product.sale_pricing()?;
        if quantity == 0 {
            return Err(CartError::InvalidQuantity { quantity });
        }
        Ok(Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price,
            original_unit_price,
            discount_percent: product.discount_percent,
            quantity,
            image_ref: product.image.clone(),
            category_ref: product.category.clone(),
        })
    }

    /// Returns `unit_price * quantity`.
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }

    /// Returns `(original_unit_price - unit_price) * quantity`.
    pub fn line_savings(&self) -> Money {
        (self.original_unit_price - self.unit_price).multiply(self.quantity)
    }

    /// Checks the per-line invariants, returning a description of the first
    /// violation.
    pub fn check(&self) -> Result<(), String> {
        if self.product_id.is_blank() {
            return Err("line without product id".to_string());
        }
        if self.quantity == 0 {
            return Err(format!("line {} has zero quantity", self.product_id));
        }
        if !self.unit_price.is_positive() {
            return Err(format!("line {} has non-positive price", self.product_id));
        }
        if self.unit_price > self.original_unit_price {
            return Err(format!(
                "line {} unit price exceeds original price",
                self.product_id
            ));
        }
        Ok(())
    }
}
