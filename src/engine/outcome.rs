//! Per-dispatch outcomes
//!
//! Every event ends in exactly one [`DispatchOutcome`]. None of them is an
//! error for the caller: unhandled events, denied access and failed handlers
//! are all reported values.

use crate::engine::binder::Unbindable;
use crate::engine::command::CommandType;
use crate::engine::effects::OutboundEffect;
use crate::engine::event::EventKind;
use crate::engine::navigation::NavigationResult;
use crate::utils::errors::InvocationError;

/// Why no handler processed the event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnhandledReason {
    /// The command declares no handler for the event kind
    NoHandler { command: CommandType, kind: EventKind },
    /// A handler exists but the event cannot satisfy its parameters
    Unbindable { command: CommandType, cause: Unbindable },
    /// The handler ran and declined the event
    Declined { command: CommandType },
}

/// Successful dispatch
#[derive(Debug)]
pub struct DispatchReport {
    /// Command whose handler ran
    pub command: CommandType,
    pub kind: EventKind,
    /// Effects produced by the handler, in order
    pub effects: Vec<OutboundEffect>,
    pub navigation: NavigationResult,
    /// The root command handled the event on behalf of the current one
    pub fallback: bool,
}

#[derive(Debug)]
pub enum DispatchOutcome {
    Handled(DispatchReport),
    Unhandled(UnhandledReason),
    /// The current command is restricted to admins
    Denied { command: CommandType },
    /// The handler failed; the stack was left as it was
    Failed(InvocationError),
}

impl DispatchOutcome {
    pub fn is_handled(&self) -> bool {
        matches!(self, DispatchOutcome::Handled(_))
    }

    pub fn is_unhandled(&self) -> bool {
        matches!(self, DispatchOutcome::Unhandled(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, DispatchOutcome::Failed(_))
    }

    pub fn report(&self) -> Option<&DispatchReport> {
        match self {
            DispatchOutcome::Handled(report) => Some(report),
            _ => None,
        }
    }

    pub fn navigation(&self) -> Option<&NavigationResult> {
        self.report().map(|report| &report.navigation)
    }

    pub fn effects(&self) -> &[OutboundEffect] {
        match self {
            DispatchOutcome::Handled(report) => &report.effects,
            _ => &[],
        }
    }

    pub fn into_effects(self) -> Vec<OutboundEffect> {
        match self {
            DispatchOutcome::Handled(report) => report.effects,
            _ => Vec::new(),
        }
    }

    /// Short label for logs
    pub fn label(&self) -> &'static str {
        match self {
            DispatchOutcome::Handled(_) => "handled",
            DispatchOutcome::Unhandled(_) => "unhandled",
            DispatchOutcome::Denied { .. } => "denied",
            DispatchOutcome::Failed(_) => "failed",
        }
    }
}
