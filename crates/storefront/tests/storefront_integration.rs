//! Integration tests for the storefront composition root and shell.

use std::sync::Arc;
use std::time::Duration;

use checkout::{CheckoutError, CheckoutStep, PaymentMethod, ShippingAddress};
use common::{Money, ProductId};
use domain::{CartError, InMemoryCatalog, Product, UserProfile, WishlistOutcome};
use storefront::commands::{self, Command};
use storefront::{Config, Storefront, StorefrontError};

fn catalog() -> Arc<InMemoryCatalog> {
    Arc::new(InMemoryCatalog::with_products([
        Product::new("A", "Kurta", Money::from_paise(1000), Money::from_paise(1500)),
        Product::new("B", "Saree", Money::from_rupees(4999), Money::from_rupees(7999)),
        Product::new("C", "Dupatta", Money::from_rupees(349), Money::from_rupees(599))
            .out_of_stock(),
    ]))
}

fn setup() -> Storefront {
    let storefront = Storefront::open(Config::default(), catalog()).unwrap();
    storefront.start();
    storefront
}

fn asha() -> UserProfile {
    UserProfile::new("asha", "Asha Rao").with_phone("9876543210")
}

fn id(s: &str) -> ProductId {
    ProductId::new(s)
}

#[tokio::test]
async fn test_add_merges_and_totals() {
    let storefront = setup();

    storefront.add_to_cart(&id("A"), 1).await.unwrap();
    storefront.add_to_cart(&id("A"), 2).await.unwrap();

    let cart = storefront.cart();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.count, 3);
    assert_eq!(cart.total, Money::from_paise(3000));
}

#[tokio::test]
async fn test_unknown_and_out_of_stock_products_are_invalid() {
    let storefront = setup();

    let unknown = storefront.add_to_cart(&id("Z"), 1).await.unwrap_err();
    assert!(matches!(
        unknown,
        StorefrontError::Cart(CartError::InvalidProduct { .. })
    ));

    let sold_out = storefront.add_to_cart(&id("C"), 1).await.unwrap_err();
    assert!(matches!(
        sold_out,
        StorefrontError::Cart(CartError::InvalidProduct { .. })
    ));
    assert!(storefront.cart().is_empty());
}

#[tokio::test]
async fn test_quantity_is_capped_by_config() {
    let config = Config::from_lookup(|key| (key == "MAX_LINE_QUANTITY").then(|| "3".to_string()));
    let storefront = Storefront::open(config, catalog()).unwrap();

    storefront.add_to_cart(&id("A"), 2).await.unwrap();
    storefront.add_to_cart(&id("A"), 2).await.unwrap();

    assert_eq!(storefront.cart().count, 3);
}

#[tokio::test]
async fn test_move_to_cart_takes_product_off_wishlist() {
    let storefront = setup();
    assert_eq!(
        storefront.toggle_wishlist(&id("B")).await.unwrap(),
        WishlistOutcome::Added
    );

    let line = storefront.move_to_cart(&id("B")).await.unwrap();

    assert_eq!(line.quantity, 1);
    assert!(storefront.wishlist().entries.is_empty());
    assert!(matches!(
        storefront.move_to_cart(&id("B")).await,
        Err(StorefrontError::NotInWishlist(_))
    ));
}

#[tokio::test]
async fn test_move_out_of_stock_product_keeps_it_on_wishlist() {
    let storefront = setup();
    storefront.toggle_wishlist(&id("C")).await.unwrap();

    let err = storefront.move_to_cart(&id("C")).await.unwrap_err();

    assert!(matches!(
        err,
        StorefrontError::Cart(CartError::InvalidProduct { .. })
    ));
    assert!(storefront.cart().is_empty());
    assert_eq!(storefront.wishlist().entries.len(), 1);
}

#[tokio::test]
async fn test_checkout_requires_login() {
    let mut storefront = setup();
    storefront.add_to_cart(&id("A"), 1).await.unwrap();

    assert!(matches!(
        storefront.start_checkout(),
        Err(StorefrontError::NotAuthenticated)
    ));
}

#[tokio::test]
async fn test_checkout_refuses_empty_cart() {
    let mut storefront = setup();
    storefront.login(asha());

    assert!(matches!(
        storefront.start_checkout(),
        Err(StorefrontError::Checkout(CheckoutError::EmptyCart))
    ));
}

#[tokio::test]
async fn test_full_checkout_records_order_for_user() {
    let mut storefront = setup();
    storefront.add_to_cart(&id("A"), 2).await.unwrap();
    storefront.login(asha());
    // The anonymous cart carries over on first login.
    assert_eq!(storefront.cart().count, 2);

    let checkout = storefront.start_checkout().unwrap();
    let view = checkout.view();
    assert_eq!(view.address.full_name, "Asha Rao");
    assert_eq!(view.address.phone, "9876543210");

    let mut address = view.address.clone();
    address.street = "12 MG Road".to_string();
    address.city = "Bengaluru".to_string();
    address.state = "Karnataka".to_string();
    address.postal_code = "560001".to_string();
    checkout.advance_address(address).unwrap();
    checkout
        .set_payment_method(PaymentMethod::CashOnDelivery)
        .unwrap();
    let order_id = checkout.submit().await.unwrap();

    assert_eq!(checkout.current_step(), CheckoutStep::Confirmation);
    assert!(storefront.cart().is_empty());
    let orders = storefront.orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].id, order_id);
    assert_eq!(orders[0].totals.total, Money::from_paise(2000));
}

#[tokio::test]
async fn test_logout_abandons_checkout_and_clears_session() {
    let mut storefront = setup();
    storefront.login(asha());
    storefront.add_to_cart(&id("A"), 1).await.unwrap();
    storefront.toggle_wishlist(&id("B")).await.unwrap();
    let checkout = storefront.start_checkout().unwrap();
    checkout
        .advance_address(ShippingAddress::new(
            "Asha", "98765", "1 Main St", "Pune", "MH", "411001",
        ))
        .unwrap();

    storefront.logout();

    assert!(storefront.cart().is_empty());
    assert!(storefront.wishlist().entries.is_empty());
    assert!(matches!(
        storefront.checkout(),
        Err(StorefrontError::NoCheckout)
    ));
    assert_eq!(checkout.current_step(), CheckoutStep::Address);
}

#[tokio::test(start_paused = true)]
async fn test_new_checkout_waits_for_abandoned_order() {
    let mut storefront = setup();
    storefront.login(asha());
    storefront.add_to_cart(&id("A"), 1).await.unwrap();
    storefront.backend().set_delay(Duration::from_secs(1));
    let checkout = storefront.start_checkout().unwrap();
    checkout
        .advance_address(ShippingAddress::new(
            "Asha", "98765", "1 Main St", "Pune", "MH", "411001",
        ))
        .unwrap();

    let restart = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        storefront.abandon_checkout();
        storefront.start_checkout().map(|_| ())
    };
    let (first, second) = tokio::join!(checkout.submit(), restart);

    assert_eq!(first, Err(CheckoutError::Stale));
    assert!(matches!(
        second,
        Err(StorefrontError::Checkout(CheckoutError::SubmissionInProgress))
    ));
    assert_eq!(storefront.orders().len(), 1);
    assert!(storefront.start_checkout().is_ok());
}

#[tokio::test]
async fn test_file_storage_restores_after_reopen() {
    let dir = std::env::temp_dir().join(format!("storefront-it-{}", uuid::Uuid::new_v4()));
    let config = Config {
        data_dir: Some(dir.clone()),
        ..Config::default()
    };

    {
        let mut storefront = Storefront::open(config.clone(), catalog()).unwrap();
        storefront.start();
        storefront.login(asha());
        storefront.add_to_cart(&id("B"), 2).await.unwrap();
    }

    let mut storefront = Storefront::open(config, catalog()).unwrap();
    storefront.start();
    assert!(storefront.cart().is_empty());
    storefront.login(asha());
    assert_eq!(storefront.cart().count, 2);

    std::fs::remove_dir_all(dir).ok();
}

async fn run(storefront: &mut Storefront, line: &str) -> Result<String, StorefrontError> {
    let command: Command = line.parse().unwrap();
    commands::execute(storefront, command).await
}

#[tokio::test]
async fn test_shell_walkthrough() {
    let mut s = setup();

    assert!(run(&mut s, "add A 2").await.unwrap().contains("items: 2"));
    assert!(run(&mut s, "checkout").await.is_err());
    run(&mut s, "login asha Asha 9876543210").await.unwrap();
    let out = run(&mut s, "checkout").await.unwrap();
    assert!(out.contains("step: Address"));
    assert!(out.contains("fullName=Asha"));

    let err = run(&mut s, "address Asha|9876543210").await.unwrap_err();
    assert!(err.to_string().contains("street, city, state, postalCode"));

    run(&mut s, "address Asha|9876543210|12 MG Road|Bengaluru|Karnataka|560001")
        .await
        .unwrap();
    run(&mut s, "pay cod").await.unwrap();
    let placed = run(&mut s, "submit").await.unwrap();
    assert!(placed.contains("order ORD-0001 placed"));
    assert!(run(&mut s, "orders").await.unwrap().contains("ORD-0001"));
    assert_eq!(run(&mut s, "cart").await.unwrap(), "cart is empty");
}
