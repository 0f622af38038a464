//! Test helpers module
//!
//! Sample command tree, recording collaborators and event builders shared by
//! the integration tests.

#![allow(dead_code)]

pub mod commands;
pub mod recording;

pub use commands::*;
pub use recording::*;

use StackBot::engine::{ConversationId, InboundEvent, InboundSender};

/// Conversation id used when a test only needs one
pub const CHAT: i64 = 100;

pub fn chat(id: i64) -> ConversationId {
    ConversationId(id)
}

/// Text event from an admin user
pub fn admin_text(conversation_id: i64, text: &str) -> InboundEvent {
    InboundEvent::text(conversation_id, text).with_sender(InboundSender {
        user_id: 1,
        username: Some("admin".to_string()),
        is_admin: true,
    })
}

/// Bot command event built from raw text, e.g. `/open`
pub fn command(conversation_id: i64, raw: &str) -> InboundEvent {
    InboundEvent::from_text(conversation_id, raw)
}
