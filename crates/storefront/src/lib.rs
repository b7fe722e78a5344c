//! Storefront session composition root.
//!
//! Wires the auth session, catalog, cart, wishlist, session bridge and
//! checkout into one explicitly constructed [`Storefront`], and provides
//! the line-oriented command shell used by the `storefront` binary.

pub mod catalog;
pub mod commands;
pub mod config;
pub mod error;

use std::sync::Arc;

use checkout::{
    CheckoutError, CheckoutStateMachine, InMemoryGatewayLoader, InMemoryOrderBackend, PlacedOrder,
};
use common::{ProductId, SessionIdentity};
use domain::{
    AuthSession, CartError, CartLineItem, CartStore, CartView, InMemoryAuthSession, Product,
    ProductCatalog, SessionBridge, SessionStart, UserProfile, WishlistOutcome, WishlistStore,
    WishlistView,
};
use persistence::{FileStorage, InMemoryStorage, PersistenceAdapter, StorageAdapter};

pub use config::Config;
pub use error::{Result, StorefrontError};

/// The checkout machine as wired by the storefront.
pub type StorefrontCheckout =
    CheckoutStateMachine<CartStore, InMemoryOrderBackend, InMemoryGatewayLoader>;

/// One shopper's session: stores, collaborators and the active checkout.
pub struct Storefront {
    config: Config,
    auth: InMemoryAuthSession,
    catalog: Arc<dyn ProductCatalog>,
    cart: CartStore,
    wishlist: WishlistStore,
    bridge: SessionBridge,
    backend: InMemoryOrderBackend,
    gateway: InMemoryGatewayLoader,
    checkout: Option<Arc<StorefrontCheckout>>,
    /// Abandoned checkout whose order may still be with the backend.
    abandoned: Option<Arc<StorefrontCheckout>>,
}

impl Storefront {
    /// Opens a storefront using the storage `config` selects.
    ///
    /// A configured data directory gets file storage; otherwise sessions
    /// live in memory.
    pub fn open(config: Config, catalog: Arc<dyn ProductCatalog>) -> Result<Self> {
        let storage: Arc<dyn StorageAdapter> = match &config.data_dir {
            Some(dir) => {
                tracing::info!(dir = %dir.display(), "using file storage");
                Arc::new(FileStorage::open(dir)?)
            }
            None => Arc::new(InMemoryStorage::new()),
        };
        Ok(Self::with_storage(config, storage, catalog))
    }

    /// Creates a storefront on `storage` and restores the anonymous session.
    pub fn with_storage(
        config: Config,
        storage: Arc<dyn StorageAdapter>,
        catalog: Arc<dyn ProductCatalog>,
    ) -> Self {
        let auth = InMemoryAuthSession::new();
        let persistence = PersistenceAdapter::new(storage, auth.current_identity());
        let cart = CartStore::new(persistence.clone(), config.cart);
        let wishlist = WishlistStore::new(persistence.clone());
        let bridge = SessionBridge::new(
            Arc::new(auth.clone()),
            cart.clone(),
            wishlist.clone(),
            persistence,
        );

        Self {
            config,
            auth,
            catalog,
            cart,
            wishlist,
            bridge,
            backend: InMemoryOrderBackend::new(),
            gateway: InMemoryGatewayLoader::new(),
            checkout: None,
            abandoned: None,
        }
    }

    /// Restores the stores for whoever the session belongs to.
    pub fn start(&self) -> SessionStart {
        self.bridge.start()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns who the session belongs to.
    pub fn identity(&self) -> SessionIdentity {
        self.auth.current_identity()
    }

    /// Returns the signed-in user's profile.
    pub fn profile(&self) -> Option<UserProfile> {
        self.auth.current_profile()
    }

    pub fn cart(&self) -> CartView {
        self.cart.view()
    }

    pub fn wishlist(&self) -> WishlistView {
        self.wishlist.view()
    }

    /// The order backend orders are placed with.
    pub fn backend(&self) -> &InMemoryOrderBackend {
        &self.backend
    }

    /// The payment gateway checkout loads.
    pub fn gateway(&self) -> &InMemoryGatewayLoader {
        &self.gateway
    }

    /// Lists the catalog.
    pub async fn products(&self) -> Result<Vec<Product>> {
        Ok(self.catalog.list_products().await?)
    }

    /// Looks up a product that can be sold right now.
    async fn sellable(&self, product_id: &ProductId) -> Result<Product> {
        let product = self
            .catalog
            .get_product(product_id)
            .await?
            .ok_or_else(|| CartError::invalid_product(product_id, "not in the catalog"))?;
        if !product.in_stock {
            return Err(CartError::invalid_product(product_id, "out of stock").into());
        }
        Ok(product)
    }

    /// Adds `quantity` of a catalog product to the cart.
    #[tracing::instrument(skip(self))]
    pub async fn add_to_cart(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<CartLineItem> {
        let product = self.sellable(product_id).await?;
        Ok(self.cart.add_item(&product, quantity)?)
    }

    /// Sets a line's quantity. Zero removes the line.
    pub fn set_quantity(&self, product_id: &ProductId, quantity: u32) -> bool {
        self.cart.set_quantity(product_id, quantity)
    }

    pub fn remove_from_cart(&self, product_id: &ProductId) -> bool {
        self.cart.remove_item(product_id)
    }

    /// Saves a catalog product to the wishlist.
    #[tracing::instrument(skip(self))]
    pub async fn toggle_wishlist(&self, product_id: &ProductId) -> Result<WishlistOutcome> {
        let product = self
            .catalog
            .get_product(product_id)
            .await?
            .ok_or_else(|| CartError::invalid_product(product_id, "not in the catalog"))?;
        Ok(self.wishlist.toggle(&product))
    }

    pub fn remove_from_wishlist(&self, product_id: &ProductId) -> bool {
        self.wishlist.remove(product_id)
    }

    /// Moves a saved product into the cart with quantity one.
    ///
    /// The cart gets the catalog's current product, not the copy saved on
    /// the wishlist. The product stays on the wishlist if it is no longer
    /// sold or the cart refuses it.
    #[tracing::instrument(skip(self))]
    pub async fn move_to_cart(&self, product_id: &ProductId) -> Result<CartLineItem> {
        if self.wishlist.entry(product_id).is_none() {
            return Err(StorefrontError::NotInWishlist(product_id.clone()));
        }
        let product = self.sellable(product_id).await?;
        let line = self.cart.add_item(&product, 1)?;
        self.wishlist.remove(product_id);
        Ok(line)
    }

    /// Signs `profile` in and rescopes the session to it.
    pub fn login(&mut self, profile: UserProfile) {
        self.abandon_checkout();
        self.auth.login(profile);
        self.bridge.sync();
    }

    /// Signs the current user out and clears their session.
    pub fn logout(&mut self) {
        self.abandon_checkout();
        self.auth.logout();
        self.bridge.sync();
    }

    /// Starts checkout, or returns the one already in progress.
    ///
    /// Requires a signed-in user and a non-empty cart. Name and phone are
    /// pre-filled from the profile. Refused while an abandoned checkout for
    /// the same user still waits on the order backend.
    pub fn start_checkout(&mut self) -> Result<Arc<StorefrontCheckout>> {
        let profile = self
            .auth
            .current_profile()
            .ok_or(StorefrontError::NotAuthenticated)?;

        if let Some(existing) = &self.checkout {
            if !existing.current_step().is_terminal() {
                return Ok(existing.clone());
            }
        }
        if let Some(previous) = self.abandoned.take() {
            if previous.submission_pending() && *previous.identity() == profile.identity() {
                self.abandoned = Some(previous);
                return Err(CheckoutError::SubmissionInProgress.into());
            }
        }
        if self.cart.is_empty() {
            return Err(CheckoutError::EmptyCart.into());
        }

        let machine = Arc::new(CheckoutStateMachine::new(
            self.cart.clone(),
            self.backend.clone(),
            self.gateway.clone(),
            profile.identity(),
            self.config.checkout,
        ));
        machine.prefill(&profile);
        tracing::info!(identity = %profile.identity(), "checkout started");

        self.checkout = Some(machine.clone());
        Ok(machine)
    }

    /// Returns the checkout in progress.
    pub fn checkout(&self) -> Result<Arc<StorefrontCheckout>> {
        self.checkout.clone().ok_or(StorefrontError::NoCheckout)
    }

    /// Leaves checkout. The cart is kept.
    pub fn abandon_checkout(&mut self) {
        if let Some(machine) = self.checkout.take() {
            machine.abandon();
            if machine.submission_pending() {
                self.abandoned = Some(machine);
            }
        }
    }

    /// Returns the signed-in user's placed orders, oldest first.
    pub fn orders(&self) -> Vec<PlacedOrder> {
        self.backend.orders_for(&self.identity())
    }
}
