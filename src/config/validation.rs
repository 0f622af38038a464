//! Configuration validation module

use crate::utils::errors::{Result, StackBotError};
use super::{BotConfig, DispatcherConfig, LoggingConfig, Settings};

/// Upper bound for `dispatcher.max_stack_depth`
pub const MAX_STACK_DEPTH_LIMIT: usize = 1024;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_bot_config(&settings.bot)?;
    validate_dispatcher_config(&settings.dispatcher)?;
    validate_logging_config(&settings.logging)?;
    Ok(())
}

fn validate_bot_config(config: &BotConfig) -> Result<()> {
    if config.token.trim().is_empty() {
        return Err(StackBotError::Config("Bot token is required".to_string()));
    }

    if !config.token.contains(':') {
        return Err(StackBotError::Config(
            "Bot token must have the form <id>:<secret>".to_string(),
        ));
    }

    Ok(())
}

/// Dispatcher limits, also used when the bot token is not needed
pub fn validate_dispatcher_config(config: &DispatcherConfig) -> Result<()> {
    if config.max_stack_depth == 0 || config.max_stack_depth > MAX_STACK_DEPTH_LIMIT {
        return Err(StackBotError::Config(format!(
            "Max stack depth must be between 1 and {}",
            MAX_STACK_DEPTH_LIMIT
        )));
    }

    if config.worker_queue_capacity == 0 {
        return Err(StackBotError::Config(
            "Worker queue capacity must be greater than 0".to_string(),
        ));
    }

    if config.worker_idle_timeout_seconds == 0 {
        return Err(StackBotError::Config(
            "Worker idle timeout must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging_config(config: &LoggingConfig) -> Result<()> {
    if config.level.trim().is_empty() {
        return Err(StackBotError::Config("Log level is required".to_string()));
    }

    if let Err(e) = tracing_subscriber::EnvFilter::try_new(&config.level) {
        return Err(StackBotError::Config(format!("Invalid log level '{}': {}", config.level, e)));
    }

    if let Some(path) = &config.file_path {
        if path.trim().is_empty() {
            return Err(StackBotError::Config(
                "Log file path must not be empty when set".to_string(),
            ));
        }
    }

    Ok(())
}
