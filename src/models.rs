//! Domain models: catalog products, per-user carts, and the order log.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A string localized per language code, e.g. `{"uz": "...", "ru": "...", "en": "..."}`.
///
/// All multilingual fields go through [`Localized::resolve`]; nothing else
/// reaches into the map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Localized(pub BTreeMap<String, String>);

impl Localized {
    /// Resolve for a language: exact match, then the system default
    /// language, then any present value, then the empty string.
    pub fn resolve<'a>(&'a self, lang: &str, default_lang: &str) -> &'a str {
        self.0
            .get(lang)
            .or_else(|| self.0.get(default_lang))
            .or_else(|| self.0.values().next())
            .map(String::as_str)
            .unwrap_or("")
    }
}

impl<const N: usize> From<[(&str, &str); N]> for Localized {
    fn from(pairs: [(&str, &str); N]) -> Self {
        Localized(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

/// The fixed set of catalog categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Cakes,
    Pastries,
    Desserts,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Cakes, Category::Pastries, Category::Desserts];

    /// Stable identifier used in callback payloads and the database.
    pub fn slug(&self) -> &'static str {
        match self {
            Category::Cakes => "cakes",
            Category::Pastries => "pastries",
            Category::Desserts => "desserts",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Category> {
        Category::ALL.into_iter().find(|c| c.slug() == slug)
    }

    /// Localization key of the category button label.
    pub fn label_key(&self) -> &'static str {
        match self {
            Category::Cakes => "cat-cakes",
            Category::Pastries => "cat-pastries",
            Category::Desserts => "cat-desserts",
        }
    }
}

/// How the customer intends to pay. Recorded on the order, never charged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
        }
    }

    pub fn from_str(s: &str) -> Option<PaymentMethod> {
        match s {
            "cash" => Some(PaymentMethod::Cash),
            "card" => Some(PaymentMethod::Card),
            _ => None,
        }
    }
}

/// Order lifecycle. `shipped` is reachable straight from `new`; no ordering
/// is enforced between `accepted` and `shipped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    New,
    Accepted,
    Shipped,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "new",
            OrderStatus::Accepted => "accepted",
            OrderStatus::Shipped => "shipped",
        }
    }

    pub fn from_str(s: &str) -> Option<OrderStatus> {
        match s {
            "new" => Some(OrderStatus::New),
            "accepted" => Some(OrderStatus::Accepted),
            "shipped" => Some(OrderStatus::Shipped),
            _ => None,
        }
    }
}

/// A catalog product. Created by the seed or the admin `/addprod` command;
/// never updated or deleted in scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub title: Localized,
    pub description: Localized,
    /// Non-negative integer currency units
    pub price: i64,
    pub category: Category,
    /// Image URL, shown as a photo caption when present
    pub image: Option<String>,
    /// Ordered free-form options, e.g. "Name on cake"
    pub special_options: Vec<String>,
    pub available: bool,
}

/// Admin product-insertion payload. Field names match the original wire
/// shape of the `/addprod` JSON (`specialOptions` and friends).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub title: Localized,
    #[serde(default)]
    pub description: Localized,
    pub price: i64,
    pub category: Category,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub special_options: Vec<String>,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

impl NewProduct {
    pub fn validate(&self) -> Result<(), crate::errors::ShopError> {
        if self.price < 0 {
            return Err(crate::errors::ShopError::MalformedInput(
                "price must be non-negative".to_string(),
            ));
        }
        if self.title.0.is_empty() {
            return Err(crate::errors::ShopError::MalformedInput(
                "title must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// One cart line. At most one line exists per product id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: i64,
    pub qty: i64,
    /// Free-form options map, currently unused beyond presence
    #[serde(default)]
    pub options: Map<String, Value>,
}

/// A user's cart. Created lazily on the first add; deleted when an order
/// is finalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub user_id: i64,
    pub items: Vec<CartItem>,
    /// Display-language hint stored alongside the cart
    pub lang: String,
}

impl Cart {
    pub fn new(user_id: i64, lang: impl Into<String>) -> Self {
        Cart {
            user_id,
            items: Vec::new(),
            lang: lang.into(),
        }
    }

    /// Merge a product into the cart: increment the existing line's
    /// quantity, or append a new line with quantity 1.
    pub fn add_product(&mut self, product_id: i64) {
        match self.items.iter_mut().find(|it| it.product_id == product_id) {
            Some(line) => line.qty += 1,
            None => self.items.push(CartItem {
                product_id,
                qty: 1,
                options: Map::new(),
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A purchased line frozen into an order: title and price are captured at
/// submission time and never recomputed from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: i64,
    pub title: String,
    pub price: i64,
    pub qty: i64,
    #[serde(default)]
    pub options: Map<String, Value>,
}

/// A finalized order. Immutable after creation except for `status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub phone: String,
    pub address: String,
    pub items: Vec<OrderItem>,
    pub total: i64,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub lang: String,
    pub created_at: DateTime<Utc>,
}

/// Order fields assembled by the checkout controller, before the store
/// assigns id, status and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub user_id: i64,
    pub name: String,
    pub phone: String,
    pub address: String,
    pub items: Vec<OrderItem>,
    pub total: i64,
    pub payment_method: PaymentMethod,
    pub lang: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_localized_resolution_order() {
        let title = Localized::from([("uz", "Tort"), ("en", "Cake")]);

        assert_eq!(title.resolve("en", "uz"), "Cake");
        assert_eq!(title.resolve("ru", "uz"), "Tort");
        // Neither requested nor default present: any value is acceptable
        assert_eq!(title.resolve("ru", "de"), "Cake");
        assert_eq!(Localized::default().resolve("en", "uz"), "");
    }

    #[test]
    fn test_cart_add_merges_lines() {
        let mut cart = Cart::new(7, "uz");
        cart.add_product(1);
        cart.add_product(1);
        cart.add_product(1);
        cart.add_product(2);

        assert_eq!(cart.items.len(), 2);
        assert_eq!(cart.items[0].product_id, 1);
        assert_eq!(cart.items[0].qty, 3);
        assert_eq!(cart.items[1].qty, 1);
    }

    #[test]
    fn test_category_slug_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::from_slug(category.slug()), Some(category));
        }
        assert_eq!(Category::from_slug("sweets"), None);
    }

    #[test]
    fn test_order_status_round_trip() {
        for status in [OrderStatus::New, OrderStatus::Accepted, OrderStatus::Shipped] {
            assert_eq!(OrderStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::from_str("canceled"), None);
    }

    #[test]
    fn test_addprod_payload_wire_shape() {
        let payload = r#"{
            "title": {"uz": "Shokoladli tort", "ru": "Шоколадный торт", "en": "Chocolate Cake"},
            "price": 45,
            "category": "cakes",
            "image": "https://example.com/cake.jpg",
            "specialOptions": ["Name on cake"]
        }"#;

        let product: NewProduct = serde_json::from_str(payload).unwrap();
        assert_eq!(product.price, 45);
        assert_eq!(product.category, Category::Cakes);
        assert_eq!(product.special_options, vec!["Name on cake".to_string()]);
        assert!(product.available);
        assert!(product.validate().is_ok());
    }

    #[test]
    fn test_addprod_payload_rejects_negative_price() {
        let payload = r#"{"title": {"en": "Cake"}, "price": -1, "category": "cakes"}"#;
        let product: NewProduct = serde_json::from_str(payload).unwrap();
        assert!(product.validate().is_err());
    }

    #[test]
    fn test_cart_item_options_default() {
        // Stored carts predating the options field still deserialize
        let item: CartItem = serde_json::from_str(r#"{"product_id": 3, "qty": 2}"#).unwrap();
        assert!(item.options.is_empty());
    }
}
