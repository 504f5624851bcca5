//! UI Builder module for creating keyboards and formatting messages

use teloxide::types::{
    ButtonRequest, InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup,
};

// Import localization
use crate::localization::{t_args_lang, t_lang};
use crate::models::{Category, Order, OrderItem, Product};

/// Main menu: category buttons, cart, language picker.
pub fn main_menu_keyboard(lang: &str) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = Category::ALL
        .iter()
        .map(|category| {
            vec![InlineKeyboardButton::callback(
                t_lang(category.label_key(), Some(lang)),
                format!("cat_{}", category.slug()),
            )]
        })
        .collect();

    rows.push(vec![InlineKeyboardButton::callback(
        t_lang("view-cart", Some(lang)),
        "view_cart",
    )]);
    rows.push(vec![InlineKeyboardButton::callback(
        t_lang("language-button", Some(lang)),
        "choose_lang",
    )]);

    InlineKeyboardMarkup::new(rows)
}

/// Language picker. Labels are intentionally not localized.
pub fn language_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback("🇺🇿 O'zbekcha", "lang_uz")],
        vec![InlineKeyboardButton::callback("🇷🇺 Русский", "lang_ru")],
        vec![InlineKeyboardButton::callback("🇺🇸 English", "lang_en")],
    ])
}

/// Buttons under a product card.
pub fn product_keyboard(product_id: i64, lang: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            t_lang("add-to-cart", Some(lang)),
            format!("add_{product_id}"),
        )],
        vec![InlineKeyboardButton::callback(
            t_lang("back-button", Some(lang)),
            "back_main",
        )],
    ])
}

/// Buttons under the cart view.
pub fn cart_keyboard(lang: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            t_lang("checkout-button", Some(lang)),
            "checkout",
        )],
        vec![InlineKeyboardButton::callback(
            t_lang("main-menu-button", Some(lang)),
            "back_main",
        )],
    ])
}

/// Payment method selection.
pub fn payment_keyboard(lang: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            t_lang("pay-cash", Some(lang)),
            "pay_cash",
        )],
        vec![InlineKeyboardButton::callback(
            t_lang("pay-card", Some(lang)),
            "pay_card",
        )],
    ])
}

/// One-time reply keyboard with a request-contact button; the contact
/// share is the only event that advances the phone stage.
pub fn contact_request_keyboard(lang: &str) -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![
        KeyboardButton::new(t_lang("send-contact-button", Some(lang)))
            .request(ButtonRequest::Contact),
    ]])
    .one_time_keyboard()
    .resize_keyboard()
}

/// Admin action controls attached to an order notification.
pub fn admin_order_keyboard(order_id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("Accept", format!("admin_accept_{order_id}")),
        InlineKeyboardButton::callback("Mark shipped", format!("admin_mark_shipped_{order_id}")),
    ]])
}

/// Product card caption: bold title, description, price line.
pub fn format_product_caption(product: &Product, lang: &str, default_lang: &str) -> String {
    let title = product.title.resolve(lang, default_lang);
    let description = product.description.resolve(lang, default_lang);
    let price = t_args_lang("price-line", &[("price", &product.price.to_string())], Some(lang));

    if description.is_empty() {
        format!("*{title}*\n{price}")
    } else {
        format!("*{title}*\n{description}\n{price}")
    }
}

/// Cart view: one line per resolved item plus the total.
pub fn format_cart(items: &[OrderItem], total: i64, lang: &str) -> String {
    let mut text = t_lang("cart-title", Some(lang));
    text.push('\n');
    for item in items {
        text.push_str(&format!("{} x{} — {}$\n", item.title, item.qty, item.price));
    }
    text.push('\n');
    text.push_str(&t_args_lang("cart-total", &[("total", &total.to_string())], Some(lang)));
    text
}

fn format_order_lines(items: &[OrderItem]) -> String {
    items
        .iter()
        .map(|item| format!("{} x{} - {}$", item.title, item.qty, item.price))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Admin-facing order summary. The admin surface is not localized, as
/// with the action buttons above.
pub fn format_order_summary(order: &Order) -> String {
    format!(
        "Order ID: {}\nUser: {}\nName: {}\nPhone: {}\nAddress: {}\nPayment: {}\nStatus: {}\nTotal: {}$\n\nItems:\n{}",
        order.id,
        order.user_id,
        order.name,
        order.phone,
        order.address,
        order.payment_method.as_str(),
        order.status.as_str(),
        order.total,
        format_order_lines(&order.items),
    )
}
