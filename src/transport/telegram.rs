//! Telegram adapter
//!
//! Converts teloxide updates into [`InboundEvent`]s and executes outbound
//! effects with the Bot API.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{
    CallbackQuery, ChatId, InlineKeyboardButton, InlineKeyboardMarkup, Message, MessageId, ParseMode, User,
};
use tracing::{debug, warn};

use crate::engine::effects::{Button, ContentType, OutboundEffect};
use crate::engine::event::{InboundEvent, InboundSender};
use crate::transport::MessageSender;
use crate::utils::errors::Result;

/// Sender identity, with admin rights taken from the configured ids
pub fn sender_of(user: &User, admin_ids: &[i64]) -> InboundSender {
    let user_id = user.id.0 as i64;
    InboundSender {
        user_id,
        username: user.username.clone(),
        is_admin: admin_ids.contains(&user_id),
    }
}

/// Text message to event; `None` for messages without text
pub fn message_to_event(msg: &Message, admin_ids: &[i64]) -> Option<InboundEvent> {
    let text = msg.text()?;
    let sender = msg
        .from
        .as_ref()
        .map(|user| sender_of(user, admin_ids))
        .unwrap_or_default();
    Some(InboundEvent::from_text(msg.chat.id.0, text).with_sender(sender))
}

/// Callback query to event. Queries without data are ignored; queries
/// without a message fall back to the user's private chat.
pub fn callback_to_event(query: &CallbackQuery, admin_ids: &[i64]) -> Option<InboundEvent> {
    let data = query.data.as_ref()?;
    let chat_id = query
        .message
        .as_ref()
        .map(|m| m.chat().id.0)
        .unwrap_or(query.from.id.0 as i64);
    let message_id = query.message.as_ref().map(|m| m.id().0);

    Some(InboundEvent::callback(chat_id, data.clone(), message_id).with_sender(sender_of(&query.from, admin_ids)))
}

fn keyboard(rows: &[Vec<Button>]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(rows.iter().map(|row| {
        row.iter()
            .map(|button| InlineKeyboardButton::callback(button.title.clone(), button.data.clone()))
            .collect::<Vec<_>>()
    }))
}

fn parse_mode(content_type: ContentType) -> Option<ParseMode> {
    match content_type {
        ContentType::Plain => None,
        ContentType::Markdown => Some(ParseMode::MarkdownV2),
        ContentType::Html => Some(ParseMode::Html),
    }
}

/// Executes effects through a teloxide [`Bot`]
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
impl MessageSender for TelegramSender {
    async fn send(&self, effect: &OutboundEffect) -> Result<()> {
        match effect {
            OutboundEffect::SendMessage {
                conversation_id,
                text,
                content_type,
                buttons,
            } => {
                let mut request = self.bot.send_message(ChatId(conversation_id.0), text.clone());
                if let Some(mode) = parse_mode(*content_type) {
                    request = request.parse_mode(mode);
                }
                if !buttons.is_empty() {
                    request = request.reply_markup(keyboard(buttons));
                }
                request.await?;
            }
            OutboundEffect::EditMessage {
                conversation_id,
                message_id,
                text,
                content_type,
                buttons,
            } => {
                let mut request =
                    self.bot
                        .edit_message_text(ChatId(conversation_id.0), MessageId(*message_id), text.clone());
                if let Some(mode) = parse_mode(*content_type) {
                    request = request.parse_mode(mode);
                }
                if !buttons.is_empty() {
                    request = request.reply_markup(keyboard(buttons));
                }
                request.await?;
            }
            OutboundEffect::DeleteMessage {
                conversation_id,
                message_id,
            } => {
                if let Err(e) = self
                    .bot
                    .delete_message(ChatId(conversation_id.0), MessageId(*message_id))
                    .await
                {
                    warn!(conversation_id = %conversation_id, message_id, error = %e, "Failed to delete message");
                }
            }
            // Queries are answered on receipt, a text becomes a regular message
            OutboundEffect::AnswerCallback { conversation_id, text } => match text {
                Some(text) => {
                    self.bot.send_message(ChatId(conversation_id.0), text.clone()).await?;
                }
                None => debug!(conversation_id = %conversation_id, "Callback already answered"),
            },
        }
        Ok(())
    }
}
