//! Message Handler module for processing commands and incoming messages
//!
//! Free text is routed by the current checkout stage; a contact-share
//! event is the only message kind that advances the phone stage. Messages
//! arriving while no stage owns them are no-ops.

use teloxide::prelude::*;
use teloxide::types::{InputFile, ParseMode};
use teloxide::utils::command::BotCommands;
use tracing::{debug, info, warn};

// Import localization
use crate::localization::t_lang;

use crate::checkout;
use crate::errors::ShopError;
use crate::models::{Category, NewProduct};
use crate::session::{CheckoutDialogue, CheckoutStage};

use super::checkout_manager;
use super::ui_builder;
use super::{AppState, HandlerResult};

/// Orders shown by the admin `/orders` listing.
const RECENT_ORDERS_LIMIT: i64 = 20;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum Command {
    #[command(description = "start the bot and show the menu.")]
    Start,
    #[command(description = "choose a language.")]
    Lang,
    #[command(description = "show the main menu.")]
    Menu,
    #[command(description = "show your cart.")]
    Cart,
    #[command(description = "list recent orders (admin only).")]
    Orders,
    #[command(description = "insert a product from a JSON payload (admin only).")]
    Addprod(String),
}

/// Handle bot commands.
pub async fn command_handler(
    bot: Bot,
    msg: Message,
    cmd: Command,
    app: AppState,
    dialogue: CheckoutDialogue,
) -> HandlerResult {
    let session = dialogue.get().await?.unwrap_or_default();
    let lang = session.lang_or(&app.config.default_lang).to_string();
    let chat_id = msg.chat.id;

    match cmd {
        Command::Start => {
            info!(user_id = %chat_id, "User started the bot");
            bot.send_message(chat_id, t_lang("welcome", Some(&lang)))
                .await?;
            send_main_menu(&bot, chat_id, &lang).await?;
        }
        Command::Lang => {
            send_language_menu(&bot, chat_id).await?;
        }
        Command::Menu => {
            send_main_menu(&bot, chat_id, &lang).await?;
        }
        Command::Cart => {
            send_cart(&bot, chat_id, &app, &lang).await?;
        }
        Command::Orders => {
            if checkout::authorize_admin(chat_id.0, app.config.admin_id).is_err() {
                warn!(user_id = %chat_id, "Non-admin /orders rejected");
                return Ok(());
            }
            send_recent_orders(&bot, chat_id, &app).await?;
        }
        Command::Addprod(payload) => {
            if checkout::authorize_admin(chat_id.0, app.config.admin_id).is_err() {
                warn!(user_id = %chat_id, "Non-admin /addprod rejected");
                return Ok(());
            }
            insert_product(&bot, chat_id, &app, &payload).await?;
        }
    }

    Ok(())
}

/// Handle plain messages: contact shares first, then free text routed by
/// the current checkout stage.
pub async fn message_handler(
    bot: Bot,
    msg: Message,
    app: AppState,
    dialogue: CheckoutDialogue,
) -> HandlerResult {
    let session = dialogue.get().await?.unwrap_or_default();

    if let Some(contact) = msg.contact() {
        let phone_number = contact.phone_number.clone();
        return checkout_manager::handle_contact_shared(
            &bot,
            &msg,
            dialogue,
            &session,
            &phone_number,
            &app.config.default_lang,
        )
        .await;
    }

    let Some(text) = msg.text() else {
        return Ok(());
    };

    match session.stage {
        CheckoutStage::AwaitingName => {
            checkout_manager::handle_name_input(
                &bot,
                &msg,
                dialogue,
                &session,
                text,
                &app.config.default_lang,
            )
            .await?;
        }
        CheckoutStage::AwaitingAddress => {
            checkout_manager::handle_address_input(
                &bot,
                &msg,
                dialogue,
                &session,
                text,
                &app.config.default_lang,
            )
            .await?;
        }
        CheckoutStage::AwaitingPhone => {
            // Only the contact-share event advances this stage
            debug!(user_id = %msg.chat.id, "Free text ignored while waiting for a contact share");
        }
        CheckoutStage::None | CheckoutStage::AwaitingPayment => {
            // No stage owns this message
        }
    }

    Ok(())
}

/// Send the main menu keyboard.
pub async fn send_main_menu(bot: &Bot, chat_id: ChatId, lang: &str) -> HandlerResult {
    bot.send_message(chat_id, t_lang("choose-category", Some(lang)))
        .reply_markup(ui_builder::main_menu_keyboard(lang))
        .await?;
    Ok(())
}

/// Send the language picker. Called directly from both the `/lang`
/// command and the `choose_lang` callback.
pub async fn send_language_menu(bot: &Bot, chat_id: ChatId) -> HandlerResult {
    bot.send_message(chat_id, t_lang("choose-language", None))
        .reply_markup(ui_builder::language_keyboard())
        .await?;
    Ok(())
}

/// Send the user's cart with resolved titles and the running total.
/// Lines whose product no longer resolves are skipped silently.
pub async fn send_cart(bot: &Bot, chat_id: ChatId, app: &AppState, lang: &str) -> HandlerResult {
    let Some(cart) = app.db.cart(chat_id.0).await?.filter(|c| !c.is_empty()) else {
        bot.send_message(chat_id, t_lang(ShopError::EmptyCart.message_key(), Some(lang)))
            .await?;
        return Ok(());
    };

    let mut resolved = Vec::new();
    for line in &cart.items {
        let product = app.db.product_by_id(line.product_id).await?;
        resolved.push((line.clone(), product));
    }
    let (items, total) =
        checkout::snapshot_items(&resolved, lang, &app.config.default_lang);

    bot.send_message(chat_id, ui_builder::format_cart(&items, total, lang))
        .reply_markup(ui_builder::cart_keyboard(lang))
        .await?;
    Ok(())
}

/// Send one card per available product of a category: a photo with
/// caption when the product has an image, a plain message otherwise.
pub async fn send_category_products(
    bot: &Bot,
    chat_id: ChatId,
    app: &AppState,
    category: Category,
    lang: &str,
) -> HandlerResult {
    let products = app.db.products_by_category(category).await?;
    if products.is_empty() {
        bot.send_message(
            chat_id,
            t_lang(
                ShopError::ProductNotFound(category.slug().to_string()).message_key(),
                Some(lang),
            ),
        )
        .await?;
        return Ok(());
    }

    for product in products {
        let caption = ui_builder::format_product_caption(&product, lang, &app.config.default_lang);
        let keyboard = ui_builder::product_keyboard(product.id, lang);

        let image_url = product.image.as_deref().and_then(|raw| {
            raw.parse::<url::Url>()
                .map_err(|e| warn!(product_id = product.id, error = %e, "Bad product image URL"))
                .ok()
        });

        match image_url {
            Some(image_url) => {
                bot.send_photo(chat_id, InputFile::url(image_url))
                    .caption(caption)
                    .parse_mode(ParseMode::Markdown)
                    .reply_markup(keyboard)
                    .await?;
            }
            None => {
                bot.send_message(chat_id, caption)
                    .parse_mode(ParseMode::Markdown)
                    .reply_markup(keyboard)
                    .await?;
            }
        }
    }
    Ok(())
}

/// Admin listing: the newest orders, each with its action controls.
async fn send_recent_orders(bot: &Bot, chat_id: ChatId, app: &AppState) -> HandlerResult {
    let orders = app.db.recent_orders(RECENT_ORDERS_LIMIT).await?;
    if orders.is_empty() {
        bot.send_message(chat_id, "Orders not found.").await?;
        return Ok(());
    }

    for order in orders {
        bot.send_message(chat_id, ui_builder::format_order_summary(&order))
            .reply_markup(ui_builder::admin_order_keyboard(order.id))
            .await?;
    }
    Ok(())
}

/// Admin product insertion from a JSON payload.
async fn insert_product(
    bot: &Bot,
    chat_id: ChatId,
    app: &AppState,
    payload: &str,
) -> HandlerResult {
    let parsed = serde_json::from_str::<NewProduct>(payload)
        .map_err(|e| ShopError::MalformedInput(e.to_string()))
        .and_then(|product| product.validate().map(|()| product));

    match parsed {
        Ok(product) => {
            let id = app.db.insert_product(&product).await?;
            bot.send_message(chat_id, format!("Product saved: {id}"))
                .await?;
        }
        Err(e) => {
            warn!(user_id = %chat_id, error = %e, "Rejected /addprod payload");
            bot.send_message(chat_id, format!("Error parsing JSON: {e}"))
                .await?;
        }
    }
    Ok(())
}
