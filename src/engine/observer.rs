//! Dispatch observers
//!
//! Observers are told about every executed handler, every contained failure
//! and every unhandled event. They must not fail; anything they do is
//! best-effort and never changes the dispatch outcome.

use tracing::{debug, warn};

use crate::engine::command::CommandType;
use crate::engine::event::{EventKind, InboundEvent};
use crate::engine::outcome::UnhandledReason;
use crate::utils::errors::InvocationError;

pub trait DispatchObserver: Send + Sync {
    /// A handler ran to completion
    fn on_executed(&self, _event: &InboundEvent, _command: CommandType, _kind: &EventKind) {}

    /// A handler failed and its changes were rolled back
    fn on_failure(&self, _event: &InboundEvent, _error: &InvocationError) {}

    /// No handler applied to the event
    fn on_unhandled(&self, _event: &InboundEvent, _reason: &UnhandledReason) {}
}

/// Default observer writing to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl DispatchObserver for TracingObserver {
    fn on_executed(&self, event: &InboundEvent, command: CommandType, kind: &EventKind) {
        debug!(
            conversation_id = %event.conversation_id,
            command = %command,
            kind = %kind,
            "Handler executed"
        );
    }

    fn on_failure(&self, event: &InboundEvent, error: &InvocationError) {
        debug!(
            conversation_id = %event.conversation_id,
            command = %error.command(),
            error = %error,
            "Observed handler failure"
        );
    }

    fn on_unhandled(&self, event: &InboundEvent, reason: &UnhandledReason) {
        warn!(
            conversation_id = %event.conversation_id,
            kind = %event.kind,
            reason = ?reason,
            "Event not handled"
        );
    }
}
