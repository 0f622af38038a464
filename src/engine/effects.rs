//! Outbound effects
//!
//! Handlers never talk to the messaging platform directly. They describe what
//! should happen and the dispatcher hands the list back to its caller, which
//! passes it to a [`MessageSender`](crate::transport::MessageSender).

use serde::{Deserialize, Serialize};

use crate::engine::event::ConversationId;

/// Single inline keyboard button
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub title: String,
    pub data: String,
}

/// Text formatting requested for a message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentType {
    #[default]
    Plain,
    Markdown,
    Html,
}

/// Request produced by a handler for the messaging collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OutboundEffect {
    SendMessage {
        conversation_id: ConversationId,
        text: String,
        content_type: ContentType,
        buttons: Vec<Vec<Button>>,
    },
    EditMessage {
        conversation_id: ConversationId,
        message_id: i32,
        text: String,
        content_type: ContentType,
        buttons: Vec<Vec<Button>>,
    },
    DeleteMessage {
        conversation_id: ConversationId,
        message_id: i32,
    },
    AnswerCallback {
        conversation_id: ConversationId,
        text: Option<String>,
    },
}

impl OutboundEffect {
    pub fn conversation_id(&self) -> ConversationId {
        match self {
            OutboundEffect::SendMessage { conversation_id, .. }
            | OutboundEffect::EditMessage { conversation_id, .. }
            | OutboundEffect::DeleteMessage { conversation_id, .. }
            | OutboundEffect::AnswerCallback { conversation_id, .. } => *conversation_id,
        }
    }

    /// Message text, if the effect carries any
    pub fn text(&self) -> Option<&str> {
        match self {
            OutboundEffect::SendMessage { text, .. } | OutboundEffect::EditMessage { text, .. } => {
                Some(text)
            }
            OutboundEffect::AnswerCallback { text, .. } => text.as_deref(),
            OutboundEffect::DeleteMessage { .. } => None,
        }
    }
}
