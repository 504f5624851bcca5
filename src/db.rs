//! Postgres data layer: the catalog, per-user carts, and the order log.
//!
//! Multilingual maps, cart lines and order-item snapshots live in JSONB
//! columns. Carts are written as whole documents through an upsert, which
//! is the single-document atomicity the storefront relies on.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use tracing::info;

use crate::models::{
    Cart, CartItem, Category, Localized, NewOrder, NewProduct, Order, OrderItem, OrderStatus,
    PaymentMethod, Product,
};

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i64,
    #[sqlx(json)]
    title: Localized,
    #[sqlx(json)]
    description: Localized,
    price: i64,
    category: String,
    image: Option<String>,
    #[sqlx(json)]
    special_options: Vec<String>,
    available: bool,
}

impl TryFrom<ProductRow> for Product {
    type Error = anyhow::Error;

    fn try_from(row: ProductRow) -> Result<Product> {
        let category = Category::from_slug(&row.category)
            .with_context(|| format!("Unknown product category: {}", row.category))?;
        Ok(Product {
            id: row.id,
            title: row.title,
            description: row.description,
            price: row.price,
            category,
            image: row.image,
            special_options: row.special_options,
            available: row.available,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CartRow {
    user_id: i64,
    #[sqlx(json)]
    items: Vec<CartItem>,
    lang: String,
}

impl From<CartRow> for Cart {
    fn from(row: CartRow) -> Cart {
        Cart {
            user_id: row.user_id,
            items: row.items,
            lang: row.lang,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    user_id: i64,
    name: String,
    phone: String,
    address: String,
    #[sqlx(json)]
    items: Vec<OrderItem>,
    total: i64,
    payment_method: String,
    status: String,
    lang: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = anyhow::Error;

    fn try_from(row: OrderRow) -> Result<Order> {
        let payment_method = PaymentMethod::from_str(&row.payment_method)
            .with_context(|| format!("Unknown payment method: {}", row.payment_method))?;
        let status = OrderStatus::from_str(&row.status)
            .with_context(|| format!("Unknown order status: {}", row.status))?;
        Ok(Order {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            phone: row.phone,
            address: row.address,
            items: row.items,
            total: row.total,
            payment_method,
            status,
            lang: row.lang,
            created_at: row.created_at,
        })
    }
}

const ORDER_COLUMNS: &str =
    "id, user_id, name, phone, address, items, total, payment_method, status, lang, created_at";

/// Shared handle over the connection pool. Cheap to clone.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to Postgres. A failure here is fatal at startup.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .context("Failed to connect to Postgres")?;
        Ok(Self { pool })
    }

    /// Initialize the database schema
    pub async fn init_schema(&self) -> Result<()> {
        info!("Initializing database schema...");

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS products (
                id BIGSERIAL PRIMARY KEY,
                title JSONB NOT NULL,
                description JSONB NOT NULL DEFAULT '{}',
                price BIGINT NOT NULL,
                category TEXT NOT NULL,
                image TEXT,
                special_options JSONB NOT NULL DEFAULT '[]',
                available BOOLEAN NOT NULL DEFAULT TRUE
            )",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create products table")?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS carts (
                user_id BIGINT PRIMARY KEY,
                items JSONB NOT NULL DEFAULT '[]',
                lang TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create carts table")?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS orders (
                id BIGSERIAL PRIMARY KEY,
                user_id BIGINT NOT NULL,
                name TEXT NOT NULL,
                phone TEXT NOT NULL,
                address TEXT NOT NULL,
                items JSONB NOT NULL,
                total BIGINT NOT NULL,
                payment_method TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'new',
                lang TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create orders table")?;

        info!("Database schema initialized successfully");
        Ok(())
    }

    /// Insert the sample catalog on first run only.
    pub async fn seed_products(&self) -> Result<()> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count products")?;
        if count > 0 {
            return Ok(());
        }

        for product in sample_products() {
            self.insert_product(&product).await?;
        }
        info!("Sample products seeded");
        Ok(())
    }

    pub async fn insert_product(&self, product: &NewProduct) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO products (title, description, price, category, image, special_options, available)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING id",
        )
        .bind(Json(&product.title))
        .bind(Json(&product.description))
        .bind(product.price)
        .bind(product.category.slug())
        .bind(&product.image)
        .bind(Json(&product.special_options))
        .bind(product.available)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert product")?;

        info!(product_id = id, "Product created");
        Ok(id)
    }

    pub async fn product_by_id(&self, id: i64) -> Result<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(
            "SELECT id, title, description, price, category, image, special_options, available
             FROM products WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to read product")?;

        row.map(Product::try_from).transpose()
    }

    /// Available products of one category, in stable store order.
    pub async fn products_by_category(&self, category: Category) -> Result<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(
            "SELECT id, title, description, price, category, image, special_options, available
             FROM products WHERE category = $1 AND available = TRUE ORDER BY id",
        )
        .bind(category.slug())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list products")?;

        rows.into_iter().map(Product::try_from).collect()
    }

    pub async fn cart(&self, user_id: i64) -> Result<Option<Cart>> {
        let row = sqlx::query_as::<_, CartRow>(
            "SELECT user_id, items, lang FROM carts WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to read cart")?;

        Ok(row.map(Cart::from))
    }

    /// Write the cart as one document, creating it if absent.
    pub async fn upsert_cart(&self, cart: &Cart) -> Result<()> {
        sqlx::query(
            "INSERT INTO carts (user_id, items, lang) VALUES ($1, $2, $3)
             ON CONFLICT (user_id) DO UPDATE SET items = EXCLUDED.items, lang = EXCLUDED.lang",
        )
        .bind(cart.user_id)
        .bind(Json(&cart.items))
        .bind(&cart.lang)
        .execute(&self.pool)
        .await
        .context("Failed to upsert cart")?;
        Ok(())
    }

    pub async fn delete_cart(&self, user_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM carts WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete cart")?;
        Ok(())
    }

    /// Append a finalized order with status `new`.
    pub async fn create_order(&self, order: &NewOrder) -> Result<Order> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "INSERT INTO orders (user_id, name, phone, address, items, total, payment_method, lang)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(order.user_id)
        .bind(&order.name)
        .bind(&order.phone)
        .bind(&order.address)
        .bind(Json(&order.items))
        .bind(order.total)
        .bind(order.payment_method.as_str())
        .bind(&order.lang)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert order")?;

        let order = Order::try_from(row)?;
        info!(order_id = order.id, user_id = order.user_id, total = order.total, "Order created");
        Ok(order)
    }

    pub async fn order_by_id(&self, id: i64) -> Result<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to read order")?;

        row.map(Order::try_from).transpose()
    }

    /// Newest orders first, for the admin listing.
    pub async fn recent_orders(&self, limit: i64) -> Result<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list orders")?;

        rows.into_iter().map(Order::try_from).collect()
    }

    /// Update an order's status. Returns false when the id does not resolve.
    pub async fn set_order_status(&self, id: i64, status: OrderStatus) -> Result<bool> {
        let result = sqlx::query("UPDATE orders SET status = $1 WHERE id = $2")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to update order status")?;

        Ok(result.rows_affected() > 0)
    }
}

/// The first-run catalog.
fn sample_products() -> Vec<NewProduct> {
    vec![
        NewProduct {
            title: Localized::from([
                ("uz", "Shokoladli tort"),
                ("ru", "Шоколадный торт"),
                ("en", "Chocolate Cake"),
            ]),
            description: Localized::from([
                ("uz", "Boy shokoladli tort"),
                ("ru", "Насыщенный шоколадный торт"),
                ("en", "Rich chocolate cake"),
            ]),
            price: 45,
            category: Category::Cakes,
            image: Some("https://i.imgur.com/Khb6XgY.jpg".to_string()),
            special_options: vec!["Ism yozish".to_string()],
            available: true,
        },
        NewProduct {
            title: Localized::from([
                ("uz", "Pishiriq (tortlets)"),
                ("ru", "Печенье (пирожное)"),
                ("en", "Pastry (tartlet)"),
            ]),
            description: Localized::from([
                ("uz", "Yengil pishiriq"),
                ("ru", "Легкая выпечка"),
                ("en", "Light pastry"),
            ]),
            price: 3,
            category: Category::Pastries,
            image: Some("https://i.imgur.com/1bX5QH6.jpg".to_string()),
            special_options: Vec::new(),
            available: true,
        },
        NewProduct {
            title: Localized::from([
                ("uz", "Karamel desert"),
                ("ru", "Десерт карамель"),
                ("en", "Caramel dessert"),
            ]),
            description: Localized::from([
                ("uz", "Mazali karamel"),
                ("ru", "Вкусная карамель"),
                ("en", "Tasty caramel"),
            ]),
            price: 5,
            category: Category::Desserts,
            image: Some("https://i.imgur.com/3GvwNBf.jpg".to_string()),
            special_options: Vec::new(),
            available: true,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_catalog_shape() {
        let products = sample_products();
        assert_eq!(products.len(), 3);
        assert!(products.iter().all(|p| p.validate().is_ok()));
        assert_eq!(products[0].price, 45);
        assert_eq!(products[0].title.resolve("en", "uz"), "Chocolate Cake");
    }
}
