//! Domain error types for the sweet shop bot.
//!
//! Every non-fatal variant maps to a short localized acknowledgment shown
//! to the user; none of them alter conversation state.

/// Errors surfaced while handling storefront and checkout events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShopError {
    /// A product referenced by a callback payload does not resolve
    ProductNotFound(String),
    /// Checkout or payment attempted without any cart lines
    EmptyCart,
    /// Payment selected without a completed checkout conversation
    CheckoutNotStarted,
    /// An admin action referenced an unknown order
    OrderNotFound(i64),
    /// The actor is not the configured administrator
    Forbidden,
    /// An admin payload failed to parse or validate
    MalformedInput(String),
    /// A required configuration value is absent (startup only, fatal)
    ConfigurationMissing(String),
}

impl ShopError {
    /// Localization key of the acknowledgment sent back to the user.
    pub fn message_key(&self) -> &'static str {
        match self {
            ShopError::ProductNotFound(_) => "product-not-found",
            ShopError::EmptyCart => "empty-cart",
            ShopError::CheckoutNotStarted => "checkout-not-started",
            ShopError::OrderNotFound(_) => "order-not-found",
            ShopError::Forbidden => "admin-only",
            ShopError::MalformedInput(_) => "invalid-payload",
            ShopError::ConfigurationMissing(_) => "configuration-missing",
        }
    }
}

impl std::fmt::Display for ShopError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShopError::ProductNotFound(id) => write!(f, "Product not found: {id}"),
            ShopError::EmptyCart => write!(f, "Cart is empty"),
            ShopError::CheckoutNotStarted => write!(f, "Checkout flow not started"),
            ShopError::OrderNotFound(id) => write!(f, "Order not found: {id}"),
            ShopError::Forbidden => write!(f, "Action restricted to the administrator"),
            ShopError::MalformedInput(msg) => write!(f, "Malformed input: {msg}"),
            ShopError::ConfigurationMissing(name) => {
                write!(f, "Missing required configuration: {name}")
            }
        }
    }
}

impl std::error::Error for ShopError {}
