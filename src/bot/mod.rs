//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `message_handler`: commands, free text and contact-share messages
//! - `callback_handler`: one dispatcher for inline keyboard callbacks
//! - `checkout_manager`: checkout conversation orchestration
//! - `ui_builder`: keyboards and message formatting

use std::sync::Arc;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;

use crate::config::Config;
use crate::db::Database;
use crate::session::{SessionState, SessionStorage};

pub mod callback_handler;
pub mod checkout_manager;
pub mod message_handler;
pub mod ui_builder;

// Re-export main handler functions and types
pub use callback_handler::{callback_handler, Action};
pub use message_handler::{command_handler, message_handler, Command};

/// Result type shared by every handler. Dialogue storage errors arrive
/// boxed, so the boxed form is the common denominator.
pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Dependencies shared by all handlers through the dispatcher.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<Config>,
}

/// The dispatcher tree: commands and plain messages on one branch,
/// callback queries on the other, both entering the session dialogue.
pub fn schema() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync>> {
    let messages = Update::filter_message()
        .enter_dialogue::<Message, SessionStorage, SessionState>()
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(command_handler),
        )
        .branch(dptree::endpoint(message_handler));

    let callbacks = Update::filter_callback_query()
        .enter_dialogue::<CallbackQuery, SessionStorage, SessionState>()
        .endpoint(callback_handler);

    dptree::entry().branch(messages).branch(callbacks)
}
