//! Callback Handler module for processing inline keyboard callback queries
//!
//! Every callback query goes through one dispatcher: the payload string is
//! parsed by prefix into an [`Action`] and routed to the matching handler.

use teloxide::prelude::*;
use tracing::{debug, warn};

// Import localization
use crate::localization::{t_lang, SUPPORTED_LANGUAGES};

use crate::checkout;
use crate::errors::ShopError;
use crate::models::{Cart, Category, OrderStatus, PaymentMethod};
use crate::session::CheckoutDialogue;

use super::checkout_manager;
use super::message_handler::{send_cart, send_category_products, send_language_menu, send_main_menu};
use super::{AppState, HandlerResult};

/// A parsed callback payload. The wire strings are the original
/// `<verb>_<argument>` encoding, e.g. `cat_cakes`, `add_7`, `lang_uz`,
/// `admin_mark_shipped_15`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    ChooseLang,
    SetLang(String),
    ViewCart,
    OpenCategory(Category),
    AddProduct(i64),
    BackToMain,
    Checkout,
    Pay(PaymentMethod),
    AdminAccept(i64),
    AdminMarkShipped(i64),
}

impl Action {
    /// Parse an action string. Prefixes with several separator-delimited
    /// tokens (`admin_mark_shipped_`) are matched before shorter ones, so
    /// the trailing argument may itself contain the separator.
    pub fn parse(data: &str) -> Option<Action> {
        match data {
            "choose_lang" => return Some(Action::ChooseLang),
            "view_cart" => return Some(Action::ViewCart),
            "back_main" => return Some(Action::BackToMain),
            "checkout" => return Some(Action::Checkout),
            "pay_cash" => return Some(Action::Pay(PaymentMethod::Cash)),
            "pay_card" => return Some(Action::Pay(PaymentMethod::Card)),
            _ => {}
        }

        if let Some(rest) = data.strip_prefix("admin_mark_shipped_") {
            return rest.parse().ok().map(Action::AdminMarkShipped);
        }
        if let Some(rest) = data.strip_prefix("admin_accept_") {
            return rest.parse().ok().map(Action::AdminAccept);
        }
        if let Some(rest) = data.strip_prefix("lang_") {
            return Some(Action::SetLang(rest.to_string()));
        }
        if let Some(rest) = data.strip_prefix("cat_") {
            return Category::from_slug(rest).map(Action::OpenCategory);
        }
        if let Some(rest) = data.strip_prefix("add_") {
            return rest.parse().ok().map(Action::AddProduct);
        }
        None
    }
}

/// Handle callback queries from inline keyboards
pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    app: AppState,
    dialogue: CheckoutDialogue,
) -> HandlerResult {
    let Some(data) = q.data.as_deref() else {
        bot.answer_callback_query(q.id).await?;
        return Ok(());
    };
    debug!(user_id = %q.from.id, data = %data, "Received callback query");

    let Some(action) = Action::parse(data) else {
        warn!(user_id = %q.from.id, data = %data, "Unrecognized callback payload");
        bot.answer_callback_query(q.id).await?;
        return Ok(());
    };

    let session = dialogue.get().await?.unwrap_or_default();
    let lang = session.lang_or(&app.config.default_lang).to_string();

    let Some(msg) = &q.message else {
        bot.answer_callback_query(q.id).await?;
        return Ok(());
    };
    let chat_id = msg.chat().id;

    match action {
        Action::SetLang(code) => {
            if !SUPPORTED_LANGUAGES.contains(&code.as_str()) {
                bot.answer_callback_query(q.id).await?;
                return Ok(());
            }
            let mut next = session;
            next.lang = Some(code.clone());
            dialogue.update(next).await?;

            bot.answer_callback_query(q.id).text("OK").await?;
            bot.send_message(chat_id, t_lang("welcome", Some(&code)))
                .await?;
            send_main_menu(&bot, chat_id, &code).await?;
        }
        Action::ChooseLang => {
            // Plain function call, never re-dispatched through the
            // event system
            bot.answer_callback_query(q.id).await?;
            send_language_menu(&bot, chat_id).await?;
        }
        Action::ViewCart => {
            send_cart(&bot, chat_id, &app, &lang).await?;
            bot.answer_callback_query(q.id).await?;
        }
        Action::OpenCategory(category) => {
            send_category_products(&bot, chat_id, &app, category, &lang).await?;
            bot.answer_callback_query(q.id).await?;
        }
        Action::BackToMain => {
            send_main_menu(&bot, chat_id, &lang).await?;
            bot.answer_callback_query(q.id).await?;
        }
        Action::AddProduct(product_id) => {
            add_to_cart(&bot, &q, &app, chat_id.0, product_id, &lang).await?;
        }
        Action::Checkout => {
            checkout_manager::handle_checkout_action(&bot, &q, &app, dialogue).await?;
        }
        Action::Pay(method) => {
            checkout_manager::handle_payment_action(&bot, &q, &app, dialogue, method).await?;
        }
        Action::AdminAccept(order_id) => {
            set_order_status(&bot, &q, &app, order_id, OrderStatus::Accepted).await?;
        }
        Action::AdminMarkShipped(order_id) => {
            set_order_status(&bot, &q, &app, order_id, OrderStatus::Shipped).await?;
        }
    }

    Ok(())
}

/// Merge a product into the user's cart, creating the cart lazily.
async fn add_to_cart(
    bot: &Bot,
    q: &CallbackQuery,
    app: &AppState,
    user_id: i64,
    product_id: i64,
    lang: &str,
) -> HandlerResult {
    let Some(product) = app.db.product_by_id(product_id).await? else {
        bot.answer_callback_query(q.id.clone())
            .text(t_lang(
                ShopError::ProductNotFound(product_id.to_string()).message_key(),
                Some(lang),
            ))
            .await?;
        return Ok(());
    };

    let mut cart = app
        .db
        .cart(user_id)
        .await?
        .unwrap_or_else(|| Cart::new(user_id, lang));
    cart.add_product(product.id);
    cart.lang = lang.to_string();
    app.db.upsert_cart(&cart).await?;

    debug!(user_id = user_id, product_id = product.id, "Product added to cart");
    bot.answer_callback_query(q.id.clone())
        .text(t_lang("added-cart", Some(lang)))
        .await?;
    Ok(())
}

/// Admin-only order status transition. `accepted` and `shipped` are both
/// reachable from any live order; no ordering is enforced between them.
async fn set_order_status(
    bot: &Bot,
    q: &CallbackQuery,
    app: &AppState,
    order_id: i64,
    status: OrderStatus,
) -> HandlerResult {
    let actor_id = q.from.id.0 as i64;
    if checkout::authorize_admin(actor_id, app.config.admin_id).is_err() {
        warn!(user_id = actor_id, order_id = order_id, "Non-admin status change rejected");
        bot.answer_callback_query(q.id.clone())
            .text("Only admin.")
            .await?;
        return Ok(());
    }

    let Some(order) = app.db.order_by_id(order_id).await? else {
        bot.answer_callback_query(q.id.clone())
            .text("Order not found.")
            .await?;
        return Ok(());
    };

    let (user_key, ack) = match status {
        OrderStatus::Accepted => ("status-accepted", "Order accepted."),
        OrderStatus::Shipped => ("status-shipped", "Marked shipped."),
        OrderStatus::New => return Ok(()),
    };

    app.db.set_order_status(order.id, status).await?;
    bot.send_message(ChatId(order.user_id), t_lang(user_key, Some(&order.lang)))
        .await?;
    bot.answer_callback_query(q.id.clone()).text(ack).await?;
    Ok(())
}
