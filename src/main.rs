use std::sync::Arc;

use anyhow::{Context, Result};
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use liftlog_bot::bot::{command_handler, dialogue_for_sender, message_handler, AppState, Command};
use liftlog_bot::config::BotConfig;
use liftlog_bot::db::{init_database_schema, PgStore};
use liftlog_bot::dialogue::ConversationStorage;
use liftlog_bot::exercise_catalog::seed_defaults;
use liftlog_bot::localization::init_localization;
use liftlog_bot::store::FitnessStore;

fn init_tracing() {
    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "liftlog_bot=info,teloxide=warn".into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json().with_current_span(false)))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    init_tracing();

    info!("Starting Liftlog Telegram Bot");

    let config = BotConfig::from_env()?;
    info!(?config, "Configuration loaded");

    init_localization().context("Failed to load localization resources")?;

    let store = PgStore::connect(&config)
        .await
        .context("Failed to connect to the database")?;
    init_database_schema(store.pool())
        .await
        .context("Failed to initialize database schema")?;
    seed_defaults(&store)
        .await
        .context("Failed to seed the exercise catalog")?;

    let store: Arc<dyn FitnessStore> = Arc::new(store);
    let state = Arc::new(AppState::new(store, config.limits.clone()));

    let bot = Bot::new(config.bot_token);

    info!("Bot initialized, starting dispatcher");

    // Updates of one chat reach the handlers one at a time (default
    // distribution), which orders each sender's conversation transitions.
    let handler = Update::filter_message()
        .map(dialogue_for_sender)
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(command_handler),
        )
        .branch(dptree::endpoint(message_handler));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state, ConversationStorage::new()])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
