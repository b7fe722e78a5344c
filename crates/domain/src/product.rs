//! Catalog products and the catalog lookup seam.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use common::{Money, ProductId};
use serde::{Deserialize, Serialize};

use crate::error::{CartError, CatalogError};

/// A product as described by the catalog.
///
/// Price fields are optional because catalog records are not guaranteed to
/// carry them; a product without both prices cannot be added to a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    pub category_id: u32,
    pub price: Option<Money>,
    pub original_price: Option<Money>,
    pub discount_percent: u8,
    pub image: String,
    pub in_stock: bool,
}

impl Product {
    /// Creates an in-stock product with both prices set.
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        price: Money,
        original_price: Money,
    ) -> Self {
        let discount_percent = discount_percent(price, original_price);
        Self {
            id: id.into(),
            name: name.into(),
            category: String::new(),
            category_id: 0,
            price: Some(price),
            original_price: Some(original_price),
            discount_percent,
            image: String::new(),
            in_stock: true,
        }
    }

    /// Sets the category name and id.
    pub fn with_category(mut self, category: impl Into<String>, category_id: u32) -> Self {
        self.category = category.into();
        self.category_id = category_id;
        self
    }

    /// Sets the image reference.
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    /// Marks the product as out of stock.
    pub fn out_of_stock(mut self) -> Self {
        self.in_stock = false;
        self
    }

    /// Returns `(price, original_price)` if the product can be sold.
    pub fn sale_pricing(&self) -> Result<(Money, Money), CartError> {
        if self.id.is_blank() {
            return Err(CartError::invalid_product(&self.id, "missing product id"));
        }
        let price = self
            .price
            .ok_or_else(|| CartError::invalid_product(&self.id, "missing price"))?;
        let original = self
            .original_price
            .ok_or_else(|| CartError::invalid_product(&self.id, "missing original price"))?;

        if !price.is_positive() {
            return Err(CartError::invalid_product(
                &self.id,
                format!("price {price} must be positive"),
            ));
        }
        if price > original {
            return Err(CartError::invalid_product(
                &self.id,
                format!("price {price} exceeds original price {original}"),
            ));
        }
        Ok((price, original))
    }
}

/// Rounded discount of `price` against `original`, in whole percent.
pub fn discount_percent(price: Money, original: Money) -> u8 {
    if !original.is_positive() || price >= original {
        return 0;
    }
    let off = i128::from((original - price).paise()) * 100;
    let original = i128::from(original.paise());
    let pct = (off + original / 2) / original;
    u8::try_from(pct.clamp(0, 100)).unwrap_or(0)
}

/// Lookup of product pricing and metadata by id.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Returns the product with the given id, if the catalog knows it.
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, CatalogError>;

    /// Returns every product in the catalog.
    async fn list_products(&self) -> Result<Vec<Product>, CatalogError>;
}

#[derive(Debug, Default)]
struct InMemoryCatalogState {
    products: HashMap<ProductId, Product>,
    order: Vec<ProductId>,
    unavailable: bool,
}

/// In-memory catalog for tests and the command shell.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    state: Arc<RwLock<InMemoryCatalogState>>,
}

impl InMemoryCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog holding `products`.
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let catalog = Self::new();
        for product in products {
            catalog.insert(product);
        }
        catalog
    }

    /// Adds or replaces a product.
    pub fn insert(&self, product: Product) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if !state.products.contains_key(&product.id) {
            state.order.push(product.id.clone());
        }
        state.products.insert(product.id.clone(), product);
    }

    /// Makes every lookup fail as if the catalog service were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .unavailable = unavailable;
    }
}

#[async_trait]
impl ProductCatalog for InMemoryCatalog {
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, CatalogError> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        if state.unavailable {
            return Err(CatalogError::Unavailable("catalog offline".to_string()));
        }
        Ok(state.products.get(id).cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>, CatalogError> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        if state.unavailable {
            return Err(CatalogError::Unavailable("catalog offline".to_string()));
        }
        Ok(state
            .order
            .iter()
            .filter_map(|id| state.products.get(id).cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discount_is_rounded_percent() {
        assert_eq!(
            discount_percent(Money::from_rupees(750), Money::from_rupees(1000)),
            25
        );
        assert_eq!(
            discount_percent(Money::from_rupees(1000), Money::from_rupees(1000)),
            0
        );
        assert_eq!(
            discount_percent(Money::from_rupees(2), Money::from_rupees(3)),
            33
        );
        assert_eq!(
            discount_percent(Money::from_paise(i64::MAX / 2), Money::from_paise(i64::MAX)),
            50
        );
    }

    #[test]
    fn sale_pricing_requires_both_prices() {
        let mut product = Product::new("p-1", "Phone", Money::from_rupees(10), Money::from_rupees(12));
        assert!(product.sale_pricing().is_ok());

        product.original_price = None;
        assert!(matches!(
            product.sale_pricing(),
            Err(CartError::InvalidProduct { .. })
        ));

        product.original_price = Some(Money::from_rupees(12));
        product.price = None;
        assert!(product.sale_pricing().is_err());
    }

    #[test]
    fn sale_pricing_rejects_price_above_original() {
        let product = Product::new("p-1", "Phone", Money::from_rupees(20), Money::from_rupees(12));
        let err = product.sale_pricing().unwrap_err();
        assert!(err.to_string().contains("exceeds original price"));
    }

    #[test]
    fn sale_pricing_rejects_blank_id_and_free_items() {
        let blank = Product::new(" ", "Ghost", Money::from_rupees(1), Money::from_rupees(1));
        assert!(blank.sale_pricing().is_err());

        let free = Product::new("p-2", "Free", Money::zero(), Money::from_rupees(1));
        assert!(free.sale_pricing().is_err());
    }

    #[tokio::test]
    async fn in_memory_catalog_lookup() {
        let catalog = InMemoryCatalog::with_products([
            Product::new("p-1", "Phone", Money::from_rupees(10), Money::from_rupees(12)),
            Product::new("p-2", "Case", Money::from_rupees(1), Money::from_rupees(1)),
        ]);

        let found = catalog.get_product(&ProductId::new("p-1")).await.unwrap();
        assert_eq!(found.unwrap().name, "Phone");
        assert!(catalog
            .get_product(&ProductId::new("nope"))
            .await
            .unwrap()
            .is_none());

        let all = catalog.list_products().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id.as_str(), "p-1");
    }

    #[tokio::test]
    async fn unavailable_catalog_errors() {
        let catalog = InMemoryCatalog::new();
        catalog.set_unavailable(true);
        assert!(catalog.get_product(&ProductId::new("p-1")).await.is_err());
    }
}
