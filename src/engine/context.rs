//! Explicit context handed to every handler invocation
//!
//! Instead of an ambient "current command" accessor, the dispatcher builds a
//! [`CommandContext`] per call: it carries the event, a read view of the stack,
//! the conversation data and a buffer for outbound effects.
//!
//! Handler bodies run on tokio's blocking pool, so they may block. Async work
//! goes through [`CommandContext::block_on`].

use std::future::Future;

use uuid::Uuid;

use crate::engine::command::CommandType;
use crate::engine::data::ConversationData;
use crate::engine::effects::{ContentType, OutboundEffect};
use crate::engine::event::{ConversationId, InboundEvent, InboundSender};
use crate::engine::system::{self, SubCommand};
use crate::utils::errors::{HandlerError, HandlerResult};

/// Context of one handler invocation
#[derive(Debug)]
pub struct CommandContext {
    event: InboundEvent,
    current: CommandType,
    instance_id: Uuid,
    stack: Vec<CommandType>,
    data: ConversationData,
    effects: Vec<OutboundEffect>,
    menu: Option<Vec<Vec<SubCommand>>>,
}

/// What the dispatcher takes back after the call
#[derive(Debug)]
pub(crate) struct ContextParts {
    pub data: ConversationData,
    pub effects: Vec<OutboundEffect>,
    pub menu: Option<Vec<Vec<SubCommand>>>,
}

impl CommandContext {
    pub(crate) fn new(
        event: InboundEvent,
        current: CommandType,
        instance_id: Uuid,
        stack: Vec<CommandType>,
        data: ConversationData,
    ) -> Self {
        Self {
            event,
            current,
            instance_id,
            stack,
            data,
            effects: Vec::new(),
            menu: None,
        }
    }

    pub(crate) fn into_parts(self) -> ContextParts {
        ContextParts {
            data: self.data,
            effects: self.effects,
            menu: self.menu,
        }
    }

    pub fn conversation_id(&self) -> ConversationId {
        self.event.conversation_id
    }

    /// Event being handled
    pub fn event(&self) -> &InboundEvent {
        &self.event
    }

    pub fn sender(&self) -> &InboundSender {
        &self.event.sender
    }

    pub fn is_admin(&self) -> bool {
        self.event.sender.is_admin
    }

    /// Command whose handler is running
    pub fn current_command(&self) -> CommandType {
        self.current
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    /// Command types on the stack, bottom to top
    pub fn stack(&self) -> &[CommandType] {
        &self.stack
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn is_root(&self) -> bool {
        self.stack.len() <= 1
    }

    /// Conversation data shared by all commands
    pub fn data(&self) -> &ConversationData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut ConversationData {
        &mut self.data
    }

    /// Wait for `future` from inside a handler. Fails when called outside a
    /// tokio runtime.
    pub fn block_on<F: Future>(&self, future: F) -> HandlerResult<F::Output> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| HandlerError::msg(format!("no runtime for async work: {}", e)))?;
        Ok(handle.block_on(future))
    }

    /// Effects buffered so far
    pub fn effects(&self) -> &[OutboundEffect] {
        &self.effects
    }

    pub fn emit(&mut self, effect: OutboundEffect) {
        self.effects.push(effect);
    }

    pub fn send_text(&mut self, text: impl Into<String>) {
        self.send_message(text, ContentType::Plain);
    }

    pub fn send_message(&mut self, text: impl Into<String>, content_type: ContentType) {
        self.emit(OutboundEffect::SendMessage {
            conversation_id: self.conversation_id(),
            text: text.into(),
            content_type,
            buttons: Vec::new(),
        });
    }

    /// Send a message with a keyboard of sub-commands. The menu is remembered
    /// on the current command, so choosing an entry later is routed by the
    /// dispatcher.
    pub fn send_menu(&mut self, text: impl Into<String>, rows: Vec<Vec<SubCommand>>) {
        self.emit(OutboundEffect::SendMessage {
            conversation_id: self.conversation_id(),
            text: text.into(),
            content_type: ContentType::Plain,
            buttons: system::to_keyboard(&rows),
        });
        self.menu = Some(rows);
    }

    /// Edit a previously sent message, replacing its keyboard with `rows`
    pub fn edit_menu(&mut self, message_id: i32, text: impl Into<String>, rows: Vec<Vec<SubCommand>>) {
        self.emit(OutboundEffect::EditMessage {
            conversation_id: self.conversation_id(),
            message_id,
            text: text.into(),
            content_type: ContentType::Plain,
            buttons: system::to_keyboard(&rows),
        });
        self.menu = Some(rows);
    }

    pub fn edit_text(&mut self, message_id: i32, text: impl Into<String>) {
        self.emit(OutboundEffect::EditMessage {
            conversation_id: self.conversation_id(),
            message_id,
            text: text.into(),
            content_type: ContentType::Plain,
            buttons: Vec::new(),
        });
    }

    pub fn delete_message(&mut self, message_id: i32) {
        self.emit(OutboundEffect::DeleteMessage {
            conversation_id: self.conversation_id(),
            message_id,
        });
    }

    pub fn answer_callback(&mut self, text: Option<String>) {
        self.emit(OutboundEffect::AnswerCallback {
            conversation_id: self.conversation_id(),
            text,
        });
    }
}
