use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::prelude::*;
use tracing::{info, warn};

use crate::dispatcher::CommandDispatcher;
use crate::platform::{deliver, IncomingMessage, Outbound};

/// Sends plain-text messages through the Bot API
#[derive(Clone)]
pub struct TelegramOutbound {
    bot: Bot,
}

impl TelegramOutbound {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Outbound for TelegramOutbound {
    async fn send(&self, chat_id: &str, text: &str) -> Result<()> {
        let id: i64 = chat_id
            .parse()
            .with_context(|| format!("Invalid Telegram chat id: {chat_id}"))?;

        self.bot
            .send_message(ChatId(id), text)
            .await
            .with_context(|| format!("Failed to send message to chat {chat_id}"))?;
        Ok(())
    }
}

/// Run the Telegram long-polling loop
pub async fn run(
    bot: Bot,
    dispatcher: Arc<CommandDispatcher>,
    outbound: Arc<dyn Outbound>,
) -> Result<()> {
    info!("Starting Telegram platform...");

    let handler = Update::filter_message().endpoint(handle_message);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![dispatcher, outbound])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("telegram"))
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn handle_message(
    msg: Message,
    dispatcher: Arc<CommandDispatcher>,
    outbound: Arc<dyn Outbound>,
) -> ResponseResult<()> {
    let text = match msg.text() {
        Some(t) => t.to_string(),
        None => return Ok(()),
    };

    let user = msg.from.as_ref();
    let incoming = IncomingMessage {
        chat_id: msg.chat.id.0.to_string(),
        user_name: user.and_then(|u| u.username.clone()),
        language_code: user.and_then(|u| u.language_code.clone()),
        text,
    };

    let user_name = incoming.user_name.as_deref().unwrap_or("<no username>");
    info!(
        "Telegram message from {} (chat {}): {}",
        user_name, incoming.chat_id, incoming.text
    );

    let replies = dispatcher.handle(&incoming).await;
    deliver(outbound.as_ref(), &replies, user_name).await;

    Ok(())
}
