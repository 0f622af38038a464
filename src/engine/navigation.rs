//! Navigation directives and handler replies

use crate::engine::command::{Command, CommandType};
use crate::utils::errors::NavigationError;

/// Stack change requested by a handler
#[derive(Debug, Default)]
pub enum NavigationDirective {
    #[default]
    None,
    Push(Box<dyn Command>),
    Pop,
    Replace(Box<dyn Command>),
    /// Pop everything above the root
    Reset,
}

impl NavigationDirective {
    pub fn is_none(&self) -> bool {
        matches!(self, NavigationDirective::None)
    }

    /// Short label for logging
    pub fn label(&self) -> &'static str {
        match self {
            NavigationDirective::None => "none",
            NavigationDirective::Push(_) => "push",
            NavigationDirective::Pop => "pop",
            NavigationDirective::Replace(_) => "replace",
            NavigationDirective::Reset => "reset",
        }
    }
}

/// What a handler returns on success.
///
/// Carries a single directive, so at most one navigation is applied per call.
#[derive(Debug)]
pub struct Reply {
    pub(crate) handled: bool,
    pub(crate) directive: NavigationDirective,
}

impl Reply {
    /// Event handled, stay on the current command
    pub fn done() -> Self {
        Self {
            handled: true,
            directive: NavigationDirective::None,
        }
    }

    /// The handler looked at the event and declined it
    pub fn unhandled() -> Self {
        Self {
            handled: false,
            directive: NavigationDirective::None,
        }
    }

    /// Enter a sub-command
    pub fn push(command: impl Command) -> Self {
        Self::navigate(NavigationDirective::Push(Box::new(command)))
    }

    /// Leave the current command
    pub fn pop() -> Self {
        Self::navigate(NavigationDirective::Pop)
    }

    /// Swap the current command for another
    pub fn replace(command: impl Command) -> Self {
        Self::navigate(NavigationDirective::Replace(Box::new(command)))
    }

    /// Return to the root command
    pub fn reset() -> Self {
        Self::navigate(NavigationDirective::Reset)
    }

    pub fn navigate(directive: NavigationDirective) -> Self {
        Self {
            handled: true,
            directive,
        }
    }

    pub fn is_handled(&self) -> bool {
        self.handled
    }

    pub fn directive(&self) -> &NavigationDirective {
        &self.directive
    }
}

impl Default for Reply {
    fn default() -> Self {
        Self::done()
    }
}

/// How the stack changed after a dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationResult {
    Unchanged,
    Pushed { current: CommandType },
    Popped { removed: CommandType, current: CommandType },
    Replaced { removed: CommandType, current: CommandType },
    Reset { removed: usize },
    /// The directive could not be applied; the stack is unchanged
    Rejected(NavigationError),
    /// The conversation ended while the handler ran; the directive was dropped
    Discarded,
}

impl NavigationResult {
    pub fn is_rejected(&self) -> bool {
        matches!(self, NavigationResult::Rejected(_))
    }
}
