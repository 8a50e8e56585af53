mod config;
mod dispatcher;
mod i18n;
mod notifier;
mod pending;
mod platform;
mod server;
mod store;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::dispatcher::CommandDispatcher;
use crate::i18n::{FluentLocalizer, Localizer};
use crate::notifier::Notifier;
use crate::pending::PendingCommands;
use crate::platform::telegram::TelegramOutbound;
use crate::platform::Outbound;
use crate::store::{FilterStore, SubscriberStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,quickalert=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    if let Some(name) = &config.telegram.bot_name {
        info!("  Bot: {}", name);
    }
    info!("  Notify API: {}", config.server.bind_address);
    info!("  Database: {}", config.storage.database_path.display());
    match config.pending_ttl() {
        Some(ttl) => info!("  Pending commands expire after {:?}", ttl),
        None => info!("  Pending commands never expire"),
    }

    let store: Arc<dyn FilterStore> = Arc::new(SubscriberStore::open(&config.storage.database_path)?);
    let localizer: Arc<dyn Localizer> = Arc::new(FluentLocalizer);

    let bot = teloxide::Bot::new(&config.telegram.bot_token);
    let outbound: Arc<dyn Outbound> = Arc::new(TelegramOutbound::new(bot.clone()));

    let dispatcher = Arc::new(CommandDispatcher::new(
        store,
        localizer.clone(),
        PendingCommands::new(config.pending_ttl()),
    ));
    let notifier = Arc::new(Notifier::new(localizer, outbound.clone()));

    info!("Bot is starting...");
    tokio::select! {
        result = server::serve(&config.server.bind_address, notifier) => {
            if let Err(e) = &result {
                error!("Notify API stopped: {:#}", e);
            }
            result
        }
        result = platform::telegram::run(bot, dispatcher, outbound) => {
            info!("Telegram dispatcher stopped");
            result
        }
    }
}
