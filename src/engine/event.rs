//! Inbound events
//!
//! Events are transport-agnostic: the transport adapter turns platform updates
//! into [`InboundEvent`] values and hands them to the dispatcher.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifies one independent chat session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConversationId(pub i64);

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ConversationId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Category of inbound payload used to select a handler.
///
/// New kinds can be added through `Custom` without touching the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// `/name args` style bot command
    Command,
    /// Free text message
    Text,
    /// Inline keyboard button press
    Callback,
    /// Request to redraw the current screen, produced by the framework
    Refresh,
    Custom(String),
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Command => f.write_str("command"),
            EventKind::Text => f.write_str("text"),
            EventKind::Callback => f.write_str("callback"),
            EventKind::Refresh => f.write_str("refresh"),
            EventKind::Custom(name) => write!(f, "custom:{}", name),
        }
    }
}

/// Payload carried by an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Payload {
    Command { name: String, args: String },
    Text(String),
    Callback { data: String, message_id: Option<i32> },
    Json(serde_json::Value),
    Empty,
}

impl Payload {
    /// Text carried by the payload, if the payload has any
    pub fn text(&self) -> Option<&str> {
        match self {
            Payload::Command { args, .. } => Some(args),
            Payload::Text(text) => Some(text),
            Payload::Callback { data, .. } => Some(data),
            Payload::Json(_) | Payload::Empty => None,
        }
    }
}

/// Who sent the event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundSender {
    pub user_id: i64,
    pub username: Option<String>,
    pub is_admin: bool,
}

/// A typed payload plus conversation identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundEvent {
    pub conversation_id: ConversationId,
    pub sender: InboundSender,
    pub kind: EventKind,
    pub payload: Payload,
    pub received_at: DateTime<Utc>,
}

impl InboundEvent {
    pub fn new(conversation_id: impl Into<ConversationId>, kind: EventKind, payload: Payload) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            sender: InboundSender::default(),
            kind,
            payload,
            received_at: Utc::now(),
        }
    }

    /// Plain text event
    pub fn text(conversation_id: impl Into<ConversationId>, text: impl Into<String>) -> Self {
        Self::new(conversation_id, EventKind::Text, Payload::Text(text.into()))
    }

    /// Bot command event, `name` without the leading slash
    pub fn command(
        conversation_id: impl Into<ConversationId>,
        name: impl Into<String>,
        args: impl Into<String>,
    ) -> Self {
        Self::new(
            conversation_id,
            EventKind::Command,
            Payload::Command { name: name.into(), args: args.into() },
        )
    }

    /// Callback event from an inline button
    pub fn callback(
        conversation_id: impl Into<ConversationId>,
        data: impl Into<String>,
        message_id: Option<i32>,
    ) -> Self {
        Self::new(
            conversation_id,
            EventKind::Callback,
            Payload::Callback { data: data.into(), message_id },
        )
    }

    /// Refresh request, produced by the dispatcher on back navigation
    pub fn refresh(conversation_id: impl Into<ConversationId>) -> Self {
        Self::new(conversation_id, EventKind::Refresh, Payload::Empty)
    }

    /// Custom event kind with a JSON payload
    pub fn custom(
        conversation_id: impl Into<ConversationId>,
        kind: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self::new(conversation_id, EventKind::Custom(kind.into()), Payload::Json(payload))
    }

    /// Classify raw message text: `/name@bot args` becomes a command event,
    /// anything else a text event
    pub fn from_text(conversation_id: impl Into<ConversationId>, raw: &str) -> Self {
        match parse_bot_command(raw) {
            Some((name, args)) => Self::command(conversation_id, name, args),
            None => Self::text(conversation_id, raw),
        }
    }

    pub fn with_sender(mut self, sender: InboundSender) -> Self {
        self.sender = sender;
        self
    }

    /// Derive a new event for the same conversation and sender
    pub fn derive(&self, kind: EventKind, payload: Payload) -> Self {
        Self {
            conversation_id: self.conversation_id,
            sender: self.sender.clone(),
            kind,
            payload,
            received_at: Utc::now(),
        }
    }
}

fn command_pattern() -> &'static regex::Regex {
    static PATTERN: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
    PATTERN.get_or_init(|| {
        regex::Regex::new(r"^/([A-Za-z0-9_]{1,32})(?:@[A-Za-z0-9_]+)?(?:\s+(.*))?$")
            .expect("static command pattern is valid")
    })
}

/// Split `/name@bot args` into a lowercase name and trimmed arguments
pub fn parse_bot_command(raw: &str) -> Option<(String, String)> {
    let caps = command_pattern().captures(raw.trim())?;
    let name = caps.get(1)?.as_str().to_lowercase();
    let args = caps.get(2).map(|m| m.as_str().trim().to_string()).unwrap_or_default();
    Some((name, args))
}
