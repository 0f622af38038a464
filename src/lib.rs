//! StackBot
//!
//! A command framework for conversational bots. Each conversation keeps a
//! stack of commands; incoming events are routed to the handler the current
//! command registered for the event kind, and handlers navigate by pushing,
//! popping or replacing commands.

#![allow(non_snake_case)]

pub mod config;
pub mod engine;
pub mod handlers;
pub mod transport;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use engine::{
    BotRuntime, Command, CommandContext, CommandSpec, Dispatcher, DispatchOutcome, HandlerRegistry, InboundEvent,
    OutboundEffect, Reply,
};
pub use utils::errors::{Result, StackBotError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
