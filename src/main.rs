mod deadline;
mod env_loader;
mod gate;
mod log_config;
mod messenger;
mod notices;
mod pending;
mod telegram;

use crate::env_loader::{BotConfig, load_env};
use crate::gate::VerificationGate;
use crate::log_config::init_logging;
use crate::telegram::{TelegramMessenger, schema};
use std::sync::Arc;
use teloxide::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment (including .env) and configure logging with defaults
    load_env();
    let config = BotConfig::from_env()?;
    init_logging(&config.log_file, config.log_level)?;

    if config.log_chat.is_none() {
        log::warn!("LOG_CHAT_ID not set, audit lines will be dropped");
    }

    let bot = Bot::new(config.token.clone());
    let me = bot.get_me().await?;
    log::info!(
        "Authorized as @{}",
        me.user.username.as_deref().unwrap_or("bot")
    );

    let messenger = Arc::new(TelegramMessenger::new(bot.clone(), config.log_chat));
    let gate = Arc::new(VerificationGate::new(messenger, config.gate));

    log::info!("Bot is running...");
    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![gate])
        .default_handler(|_| async {})
        .error_handler(LoggingErrorHandler::with_custom_text("Dispatcher error"))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    log::info!("Shutting down.");
    Ok(())
}
