//! End-to-end checkout flow tests over the state machine and the
//! cart-to-order snapshot logic.

use sweetshop_bot::checkout::{authorize_admin, build_order, snapshot_items, ResolvedLine};
use sweetshop_bot::errors::ShopError;
use sweetshop_bot::models::{Cart, Category, Localized, PaymentMethod, Product};
use sweetshop_bot::session::{CheckoutStage, SessionState};

const ADMIN_ID: i64 = 999;

fn chocolate_cake() -> Product {
    Product {
        id: 1,
        title: Localized::from([("uz", "Shokoladli tort"), ("en", "Chocolate Cake")]),
        description: Localized::from([("en", "Rich chocolate cake")]),
        price: 45,
        category: Category::Cakes,
        image: None,
        special_options: vec!["Name on cake".to_string()],
        available: true,
    }
}

fn caramel_dessert() -> Product {
    Product {
        id: 2,
        title: Localized::from([("uz", "Karamel desert"), ("en", "Caramel dessert")]),
        description: Localized::default(),
        price: 5,
        category: Category::Desserts,
        image: None,
        special_options: Vec::new(),
        available: true,
    }
}

fn resolve(cart: &Cart) -> Vec<ResolvedLine> {
    cart.items
        .iter()
        .map(|line| {
            let product = match line.product_id {
                1 => Some(chocolate_cake()),
                2 => Some(caramel_dessert()),
                _ => None,
            };
            (line.clone(), product)
        })
        .collect()
}

/// The reference scenario: product A (45) twice, product B (5) once,
/// checkout with a contact-shared phone and cash payment.
#[test]
fn test_reference_checkout_scenario() {
    let mut cart = Cart::new(100, "en");
    cart.add_product(1);
    cart.add_product(1);
    cart.add_product(2);

    // Two adds of the same product merge into one line
    assert_eq!(cart.items.len(), 2);
    assert_eq!(cart.items[0].qty, 2);

    let session = SessionState::with_lang("en")
        .begin_checkout(cart.items.len())
        .unwrap()
        .submit_name("Aziz")
        .unwrap()
        .submit_contact("+998901234567")
        .unwrap()
        .submit_address("Tashkent, St. 1")
        .unwrap();

    let order = build_order(&session, &cart, &resolve(&cart), PaymentMethod::Cash, "uz").unwrap();

    assert_eq!(order.user_id, 100);
    assert_eq!(order.name, "Aziz");
    assert_eq!(order.phone, "+998901234567");
    assert_eq!(order.address, "Tashkent, St. 1");
    assert_eq!(order.payment_method, PaymentMethod::Cash);
    assert_eq!(order.lang, "en");
    assert_eq!(order.total, 95);
    assert_eq!(order.items.len(), 2);
    assert_eq!(order.items[0].title, "Chocolate Cake");
    assert_eq!(order.items[0].qty, 2);
    assert_eq!(order.items[0].price, 45);
    assert_eq!(order.items[1].title, "Caramel dessert");
    assert_eq!(order.items[1].qty, 1);
    assert_eq!(order.items[1].price, 5);
}

/// Checkout on an empty cart fails and leaves the stage at `None`.
#[test]
fn test_empty_cart_blocks_checkout() {
    let session = SessionState::default();
    assert_eq!(session.begin_checkout(0), Err(ShopError::EmptyCart));
    assert_eq!(session.stage, CheckoutStage::None);
}

/// Selecting a payment without walking the conversation fails with
/// `CheckoutNotStarted`, e.g. after a restart wiped the session store.
#[test]
fn test_payment_without_conversation_is_rejected() {
    let mut cart = Cart::new(100, "en");
    cart.add_product(1);

    let fresh = SessionState::default();
    let err = build_order(&fresh, &cart, &resolve(&cart), PaymentMethod::Card, "uz").unwrap_err();
    assert_eq!(err, ShopError::CheckoutNotStarted);
}

/// Products deleted between add-to-cart and payment are skipped silently;
/// the rest of the cart still becomes an order.
#[test]
fn test_vanished_product_is_skipped_at_submission() {
    let mut cart = Cart::new(100, "en");
    cart.add_product(1);
    cart.add_product(77); // no longer in the catalog

    let session = SessionState::with_lang("en")
        .begin_checkout(cart.items.len())
        .unwrap()
        .submit_name("Aziz")
        .unwrap()
        .submit_contact("+998901234567")
        .unwrap()
        .submit_address("Tashkent, St. 1")
        .unwrap();

    let order = build_order(&session, &cart, &resolve(&cart), PaymentMethod::Cash, "uz").unwrap();
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.total, 45);
}

/// Snapshot titles follow the order's language, with the default language
/// as the fallback.
#[test]
fn test_snapshot_titles_use_order_language() {
    let mut cart = Cart::new(100, "uz");
    cart.add_product(1);

    let (items, _) = snapshot_items(&resolve(&cart), "uz", "uz");
    assert_eq!(items[0].title, "Shokoladli tort");

    // Russian title is absent: falls back to the default language
    let (items, _) = snapshot_items(&resolve(&cart), "ru", "uz");
    assert_eq!(items[0].title, "Shokoladli tort");
}

/// Only the configured administrator may advance an order's status.
#[test]
fn test_status_changes_are_admin_only() {
    assert!(authorize_admin(ADMIN_ID, ADMIN_ID).is_ok());
    assert_eq!(authorize_admin(100, ADMIN_ID), Err(ShopError::Forbidden));
}
