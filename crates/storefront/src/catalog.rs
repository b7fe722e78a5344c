//! Seed catalog for the command shell.

use common::Money;
use domain::{InMemoryCatalog, Product};

/// Returns a small apparel catalog with one product out of stock.
pub fn demo_catalog() -> InMemoryCatalog {
    InMemoryCatalog::with_products([
        Product::new(
            "men-kurta-01",
            "Cotton Straight Kurta",
            Money::from_rupees(899),
            Money::from_rupees(1499),
        )
        .with_category("Men", 1)
        .with_image("images/men-kurta-01.jpg"),
        Product::new(
            "men-shirt-02",
            "Linen Casual Shirt",
            Money::from_rupees(1299),
            Money::from_rupees(1299),
        )
        .with_category("Men", 1)
        .with_image("images/men-shirt-02.jpg"),
        Product::new(
            "women-saree-01",
            "Banarasi Silk Saree",
            Money::from_rupees(4999),
            Money::from_rupees(7999),
        )
        .with_category("Women", 2)
        .with_image("images/women-saree-01.jpg"),
        Product::new(
            "women-dupatta-03",
            "Printed Chiffon Dupatta",
            Money::from_rupees(349),
            Money::from_rupees(599),
        )
        .with_category("Women", 2)
        .with_image("images/women-dupatta-03.jpg"),
        Product::new(
            "kids-set-01",
            "Festive Kurta Pyjama Set",
            Money::from_rupees(749),
            Money::from_rupees(999),
        )
        .with_category("Kids", 3)
        .with_image("images/kids-set-01.jpg")
        .out_of_stock(),
    ])
}
