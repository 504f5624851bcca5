use std::sync::Arc;

use anyhow::Result;
use teloxide::dispatching::dialogue::{InMemStorage, Storage};
use teloxide::prelude::*;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use sweetshop_bot::bot::{schema, AppState};
use sweetshop_bot::config::Config;
use sweetshop_bot::db::Database;
use sweetshop_bot::localization::init_localization;
use sweetshop_bot::session::{SessionState, SessionStorage};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Configuration or connectivity problems at startup are fatal
    if let Err(e) = run().await {
        error!(error = %format!("{e:#}"), "Fatal startup error");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config = Config::from_env()?;

    info!("Starting Sweet Shop Telegram Bot");

    init_localization(&config.default_lang)?;

    let db = Database::connect(&config.database_url).await?;
    db.init_schema().await?;
    db.seed_products().await?;

    let bot = Bot::new(&config.bot_token);

    // In-memory session store behind the erased storage interface; swap
    // for a distributed or persisted backing here without touching the
    // checkout state machine.
    let storage: Arc<SessionStorage> = InMemStorage::<SessionState>::new().erase();

    let state = AppState {
        db,
        config: Arc::new(config),
    };

    info!("Bot initialized, starting dispatcher");

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![state, storage])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
