//! Configuration management module
//!
//! Settings are read from an optional `config.toml` and `STACKBOT__*`
//! environment variables, then validated before the bot starts.

pub mod settings;
pub mod validation;

pub use settings::{BotConfig, DispatcherConfig, LoggingConfig, Settings};
