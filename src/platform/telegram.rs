use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{KeyboardButton, KeyboardMarkup, ReplyMarkup};
use tracing::{debug, info, warn};

use crate::platform::{IncomingMessage, ReplySender};
use crate::reply::Reply;
use crate::router::Router;

/// Split long messages for Telegram's 4096 char limit
fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = (start + max_len).min(text.len());
        // Walk back to a valid UTF-8 char boundary so slicing doesn't panic
        while end > start && !text.is_char_boundary(end) {
            end -= 1;
        }
        let actual_end = if end < text.len() {
            text[start..end]
                .rfind('\n')
                .or_else(|| text[start..end].rfind(' '))
                .map(|pos| start + pos + 1)
                .unwrap_or(end)
        } else {
            end
        };

        chunks.push(text[start..actual_end].to_string());
        start = actual_end;
    }

    chunks
}

/// Plain text clears any keyboard left over from an earlier reply; suggestions
/// become a single row that resizes to fit and hides after one tap.
pub fn reply_markup(reply: &Reply) -> ReplyMarkup {
    let options = reply.options();
    if options.is_empty() {
        return ReplyMarkup::kb_remove();
    }
    let row: Vec<KeyboardButton> = options.iter().map(KeyboardButton::new).collect();
    ReplyMarkup::Keyboard(
        KeyboardMarkup::new(vec![row])
            .resize_keyboard()
            .one_time_keyboard(),
    )
}

/// Sends replies through the Bot API.
#[derive(Clone)]
pub struct TelegramSender {
    bot: Bot,
}

impl TelegramSender {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ReplySender for TelegramSender {
    async fn send(&self, chat_id: i64, reply: Reply) -> Result<()> {
        let markup = reply_markup(&reply);
        for chunk in split_message(reply.text(), 4000) {
            self.bot
                .send_message(ChatId(chat_id), chunk)
                .reply_markup(markup.clone())
                .await?;
        }
        Ok(())
    }
}

/// Run the Telegram bot platform. Blocks until the dispatcher stops.
pub async fn run(router: Arc<Router>, bot: Bot) -> Result<()> {
    info!("Starting Telegram platform...");

    let handler = Update::filter_message().endpoint(handle_message);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![router])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("telegram"))
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn handle_message(bot: Bot, msg: Message, router: Arc<Router>) -> ResponseResult<()> {
    let Some(user) = msg.from.as_ref() else {
        debug!("Ignoring message without sender in chat {}", msg.chat.id);
        return Ok(());
    };

    let Some(text) = msg.text() else {
        debug!("Ignoring non-text message from {}", user.id);
        return Ok(());
    };

    let incoming = IncomingMessage {
        sender_id: user.id.0,
        chat_id: msg.chat.id.0,
        text: text.to_string(),
    };

    info!("Telegram message from {} ({})", user.first_name, user.id);

    // Each message gets its own task so a slow command never holds up others.
    let sender = TelegramSender::new(bot);
    tokio::spawn(async move {
        router.serve(&incoming, &sender).await;
    });

    Ok(())
}
