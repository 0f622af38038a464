//! Error handling for StackBot
//!
//! This module defines the error types used throughout the framework.
//! Registration errors are fatal at startup; everything that can happen while
//! dispatching a single event is recoverable and surfaces as a dispatch outcome.

use thiserror::Error;

use crate::engine::command::CommandType;
use crate::engine::event::EventKind;

/// Main error type for StackBot
#[derive(Error, Debug)]
pub enum StackBotError {
    #[error("Registration error: {0}")]
    Registration(#[from] RegistrationError),

    #[error("Navigation error: {0}")]
    Navigation(#[from] NavigationError),

    #[error("Invocation error: {0}")]
    Invocation(#[from] InvocationError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration loading error: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Telegram API error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while building the handler registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("Command {command} declares more than one handler for {kind}")]
    DuplicateHandler { command: CommandType, kind: EventKind },

    #[error("Handler {command}/{kind} has a malformed parameter shape: {reason}")]
    MalformedShape {
        command: CommandType,
        kind: EventKind,
        reason: String,
    },

    #[error("Command {command} was already registered with different handlers")]
    ConflictingRegistration { command: CommandType },

    #[error("Command name '{name}' is used by two different types")]
    NameConflict { name: String },

    #[error("Root command {command} is not registered")]
    UnregisteredRoot { command: CommandType },
}

/// Errors raised when a navigation directive cannot be applied
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    #[error("Cannot pop the root command")]
    CannotPopRoot,

    #[error("Stack depth limit of {limit} reached")]
    DepthExceeded { limit: usize },

    #[error("Command {command} is not registered")]
    UnregisteredCommand { command: CommandType },

    #[error("Command {command} has no factory and cannot be entered from a menu")]
    NoFactory { command: CommandType },

    #[error("Command {command} cannot be created from the menu state: {reason}")]
    InvalidState { command: CommandType, reason: String },

    #[error("Leave hook of {command} panicked: {message}")]
    LeaveFailed { command: CommandType, message: String },
}

/// Error returned by a handler body
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("{0}")]
    Message(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HandlerError {
    /// Create a handler error from any displayable message
    pub fn msg(message: impl Into<String>) -> Self {
        HandlerError::Message(message.into())
    }
}

/// Failure caught at the invocation boundary
#[derive(Error, Debug)]
pub enum InvocationError {
    #[error("Handler {command}/{kind} failed: {source}")]
    Handler {
        command: CommandType,
        kind: EventKind,
        #[source]
        source: HandlerError,
    },

    #[error("Handler {command}/{kind} panicked: {message}")]
    Panicked {
        command: CommandType,
        kind: EventKind,
        message: String,
    },

    #[error("Handler {command}/{kind} was aborted: {reason}")]
    Aborted {
        command: CommandType,
        kind: EventKind,
        reason: String,
    },

    #[error("Leave hook of {command} panicked: {message}")]
    LeaveFailed { command: CommandType, message: String },
}

impl InvocationError {
    /// Command type whose handler failed
    pub fn command(&self) -> CommandType {
        match self {
            InvocationError::Handler { command, .. } => *command,
            InvocationError::Panicked { command, .. } => *command,
            InvocationError::Aborted { command, .. } => *command,
            InvocationError::LeaveFailed { command, .. } => *command,
        }
    }
}

/// Readable message of a caught panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_string()
    }
}

/// Result type alias for StackBot operations
pub type Result<T> = std::result::Result<T, StackBotError>;

/// Result type returned by handler bodies
pub type HandlerResult<T> = std::result::Result<T, HandlerError>;

impl StackBotError {
    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            StackBotError::Registration(_) => false,
            StackBotError::Navigation(_) => true,
            StackBotError::Invocation(_) => true,
            StackBotError::Config(_) => false,
            StackBotError::ConfigLoad(_) => false,
            StackBotError::Toml(_) => false,
            StackBotError::Telegram(_) => true,
            StackBotError::Transport(_) => true,
            StackBotError::Serialization(_) => false,
            StackBotError::Io(_) => true,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            StackBotError::Registration(_) => ErrorSeverity::Critical,
            StackBotError::Config(_) => ErrorSeverity::Critical,
            StackBotError::ConfigLoad(_) => ErrorSeverity::Critical,
            StackBotError::Toml(_) => ErrorSeverity::Critical,
            StackBotError::Navigation(_) => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
