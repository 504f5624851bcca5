//! Cart-to-order resolution: line snapshots, totals, and the admin guard.
//!
//! Snapshots are taken against the live catalog at submission time, so an
//! order records the titles and prices that were current when the user
//! paid, and keeps them even if the catalog changes afterwards.

use crate::errors::ShopError;
use crate::models::{Cart, CartItem, NewOrder, OrderItem, PaymentMethod, Product};
use crate::session::SessionState;

/// A cart line paired with its catalog resolution. `None` means the
/// product vanished since it was added; such lines are skipped silently.
pub type ResolvedLine = (CartItem, Option<Product>);

/// Freeze resolved cart lines into order items and compute the total.
pub fn snapshot_items(
    lines: &[ResolvedLine],
    lang: &str,
    default_lang: &str,
) -> (Vec<OrderItem>, i64) {
    let mut items = Vec::new();
    let mut total = 0;
    for (line, product) in lines {
        let Some(product) = product else { continue };
        items.push(OrderItem {
            product_id: product.id,
            title: product.title.resolve(lang, default_lang).to_string(),
            price: product.price,
            qty: line.qty,
            options: line.options.clone(),
        });
        total += product.price * line.qty;
    }
    (items, total)
}

/// Assemble the order record for a completed checkout conversation.
///
/// Re-checks both terminal guards: the draft must be complete
/// (`CheckoutNotStarted`) and the cart still non-empty (`EmptyCart`).
pub fn build_order(
    session: &SessionState,
    cart: &Cart,
    resolved: &[ResolvedLine],
    payment_method: PaymentMethod,
    default_lang: &str,
) -> Result<NewOrder, ShopError> {
    session.ready_for_payment()?;
    if cart.is_empty() {
        return Err(ShopError::EmptyCart);
    }

    let lang = session.lang_or(default_lang);
    let (items, total) = snapshot_items(resolved, lang, default_lang);
    let draft = &session.draft;

    Ok(NewOrder {
        user_id: cart.user_id,
        name: draft.name.clone().unwrap_or_default(),
        phone: draft.phone.clone().unwrap_or_default(),
        address: draft.address.clone().unwrap_or_default(),
        items,
        total,
        payment_method,
        lang: lang.to_string(),
    })
}

/// Order-status changes are restricted to the configured administrator.
pub fn authorize_admin(actor_id: i64, admin_id: i64) -> Result<(), ShopError> {
    if actor_id == admin_id {
        Ok(())
    } else {
        Err(ShopError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Localized};

    fn product(id: i64, price: i64, title_en: &str) -> Product {
        Product {
            id,
            title: Localized::from([("en", title_en)]),
            description: Localized::default(),
            price,
            category: Category::Cakes,
            image: None,
            special_options: Vec::new(),
            available: true,
        }
    }

    fn line(product_id: i64, qty: i64) -> CartItem {
        CartItem {
            product_id,
            qty,
            options: serde_json::Map::new(),
        }
    }

    #[test]
    fn test_snapshot_totals() {
        let resolved = vec![
            (line(1, 2), Some(product(1, 45, "Chocolate Cake"))),
            (line(2, 1), Some(product(2, 5, "Caramel dessert"))),
        ];

        let (items, total) = snapshot_items(&resolved, "en", "uz");
        assert_eq!(total, 95);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Chocolate Cake");
        assert_eq!(items[0].qty, 2);
        assert_eq!(items[0].price, 45);
    }

    #[test]
    fn test_snapshot_skips_vanished_products() {
        let resolved = vec![
            (line(1, 2), Some(product(1, 45, "Chocolate Cake"))),
            (line(9, 3), None),
        ];

        let (items, total) = snapshot_items(&resolved, "en", "uz");
        assert_eq!(items.len(), 1);
        assert_eq!(total, 90);
    }

    #[test]
    fn test_snapshot_survives_catalog_edits() {
        let resolved = vec![(line(1, 2), Some(product(1, 45, "Chocolate Cake")))];
        let (items, total) = snapshot_items(&resolved, "en", "uz");

        // A later price edit does not reach back into the snapshot
        let repriced = product(1, 60, "Chocolate Cake");
        assert_eq!(repriced.price, 60);
        assert_eq!(items[0].price, 45);
        assert_eq!(total, 90);
    }

    #[test]
    fn test_build_order_requires_conversation() {
        let mut cart = Cart::new(7, "en");
        cart.add_product(1);

        let idle = SessionState::default();
        let err = build_order(&idle, &cart, &[], PaymentMethod::Cash, "uz").unwrap_err();
        assert_eq!(err, ShopError::CheckoutNotStarted);
    }

    #[test]
    fn test_build_order_requires_cart_lines() {
        let session = SessionState::default()
            .begin_checkout(1)
            .unwrap()
            .submit_name("Aziz")
            .unwrap()
            .submit_contact("+998901234567")
            .unwrap()
            .submit_address("Tashkent, St. 1")
            .unwrap();

        let empty = Cart::new(7, "en");
        let err = build_order(&session, &empty, &[], PaymentMethod::Cash, "uz").unwrap_err();
        assert_eq!(err, ShopError::EmptyCart);
    }

    #[test]
    fn test_admin_guard() {
        assert!(authorize_admin(42, 42).is_ok());
        assert_eq!(authorize_admin(43, 42), Err(ShopError::Forbidden));
    }
}
