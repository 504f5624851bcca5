//! Checkout Manager module for driving the checkout conversation
//!
//! Stage transitions themselves are pure functions on
//! [`SessionState`](crate::session::SessionState); this module glues them
//! to the chat transport, the session store and the database.

use teloxide::prelude::*;
use tracing::{debug, info};

// Import localization
use crate::localization::t_lang;

// Import checkout types
use crate::checkout;
use crate::errors::ShopError;
use crate::models::PaymentMethod;
use crate::session::{CheckoutDialogue, CheckoutStage, SessionState};

// Import UI builder functions
use super::ui_builder;
use super::{AppState, HandlerResult};

/// Handle the `checkout` button: `None -> AwaitingName`, guarded on a
/// non-empty cart.
pub async fn handle_checkout_action(
    bot: &Bot,
    q: &CallbackQuery,
    app: &AppState,
    dialogue: CheckoutDialogue,
) -> HandlerResult {
    let Some(msg) = &q.message else {
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };
    let chat_id = msg.chat().id;

    let session = dialogue.get().await?.unwrap_or_default();
    let lang = session.lang_or(&app.config.default_lang).to_string();

    if session.stage != CheckoutStage::None {
        debug!(user_id = %chat_id, "Checkout already in progress, keeping position");
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    }

    let cart_len = app
        .db
        .cart(chat_id.0)
        .await?
        .map(|cart| cart.items.len())
        .unwrap_or(0);

    match session.begin_checkout(cart_len) {
        Ok(next) => {
            dialogue.update(next).await?;
            bot.send_message(chat_id, t_lang("enter-name", Some(&lang)))
                .await?;
            bot.answer_callback_query(q.id.clone()).await?;
        }
        Err(e) => {
            bot.answer_callback_query(q.id.clone())
                .text(t_lang(e.message_key(), Some(&lang)))
                .await?;
        }
    }

    Ok(())
}

/// Free text while `AwaitingName`: store it verbatim and ask for the phone
/// number via a request-contact keyboard.
pub async fn handle_name_input(
    bot: &Bot,
    msg: &Message,
    dialogue: CheckoutDialogue,
    session: &SessionState,
    text: &str,
    default_lang: &str,
) -> HandlerResult {
    let Some(next) = session.submit_name(text) else {
        return Ok(());
    };
    let lang = next.lang_or(default_lang).to_string();
    dialogue.update(next).await?;

    bot.send_message(msg.chat.id, t_lang("send-phone", Some(&lang)))
        .reply_markup(ui_builder::contact_request_keyboard(&lang))
        .await?;
    Ok(())
}

/// A contact-share event while `AwaitingPhone`. Any other stage ignores
/// the share; free text never advances this stage at all.
pub async fn handle_contact_shared(
    bot: &Bot,
    msg: &Message,
    dialogue: CheckoutDialogue,
    session: &SessionState,
    phone_number: &str,
    default_lang: &str,
) -> HandlerResult {
    let Some(next) = session.submit_contact(phone_number) else {
        debug!(user_id = %msg.chat.id, "Contact share outside the phone stage ignored");
        return Ok(());
    };
    let lang = next.lang_or(default_lang).to_string();
    dialogue.update(next).await?;

    bot.send_message(msg.chat.id, t_lang("enter-address", Some(&lang)))
        .await?;
    Ok(())
}

/// Free text while `AwaitingAddress`: store it verbatim and offer the
/// payment methods.
pub async fn handle_address_input(
    bot: &Bot,
    msg: &Message,
    dialogue: CheckoutDialogue,
    session: &SessionState,
    text: &str,
    default_lang: &str,
) -> HandlerResult {
    let Some(next) = session.submit_address(text) else {
        return Ok(());
    };
    let lang = next.lang_or(default_lang).to_string();
    dialogue.update(next).await?;

    bot.send_message(msg.chat.id, t_lang("choose-payment", Some(&lang)))
        .reply_markup(ui_builder::payment_keyboard(&lang))
        .await?;
    Ok(())
}

/// Terminal transition: snapshot the cart against the live catalog,
/// persist the order, drop the cart, clear the session, and notify both
/// the user and the administrator.
pub async fn handle_payment_action(
    bot: &Bot,
    q: &CallbackQuery,
    app: &AppState,
    dialogue: CheckoutDialogue,
    method: PaymentMethod,
) -> HandlerResult {
    let Some(msg) = &q.message else {
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };
    let chat_id = msg.chat().id;

    let session = dialogue.get().await?.unwrap_or_default();
    let lang = session.lang_or(&app.config.default_lang).to_string();

    if let Err(e) = session.ready_for_payment() {
        bot.answer_callback_query(q.id.clone())
            .text(t_lang(e.message_key(), Some(&lang)))
            .await?;
        return Ok(());
    }

    let Some(cart) = app.db.cart(chat_id.0).await?.filter(|c| !c.is_empty()) else {
        bot.answer_callback_query(q.id.clone())
            .text(t_lang(ShopError::EmptyCart.message_key(), Some(&lang)))
            .await?;
        return Ok(());
    };

    // Snapshot against the catalog as it is right now
    let mut resolved = Vec::new();
    for line in &cart.items {
        let product = app.db.product_by_id(line.product_id).await?;
        resolved.push((line.clone(), product));
    }

    let new_order = match checkout::build_order(
        &session,
        &cart,
        &resolved,
        method,
        &app.config.default_lang,
    ) {
        Ok(order) => order,
        Err(e) => {
            bot.answer_callback_query(q.id.clone())
                .text(t_lang(e.message_key(), Some(&lang)))
                .await?;
            return Ok(());
        }
    };

    let order = app.db.create_order(&new_order).await?;
    app.db.delete_cart(cart.user_id).await?;
    dialogue.exit().await?;

    info!(
        user_id = %chat_id,
        order_id = order.id,
        total = order.total,
        "Order finalized"
    );

    bot.send_message(chat_id, t_lang("order-received", Some(&lang)))
        .await?;

    let admin_text = format!(
        "{}\n{}",
        t_lang("admin-notify", Some(&order.lang)),
        ui_builder::format_order_summary(&order)
    );
    bot.send_message(ChatId(app.config.admin_id), admin_text)
        .reply_markup(ui_builder::admin_order_keyboard(order.id))
        .await?;

    bot.answer_callback_query(q.id.clone()).text("OK").await?;
    Ok(())
}
