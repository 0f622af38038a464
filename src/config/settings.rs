//! Application settings
//!
//! Every section has defaults, so a config file only needs the values it
//! changes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::dispatcher::FallbackPolicy;
use crate::engine::stack::DEFAULT_MAX_DEPTH;
use crate::utils::errors::Result;

/// Environment variable prefix, e.g. `STACKBOT__BOT__TOKEN`
pub const ENV_PREFIX: &str = "STACKBOT";

/// Main application configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub bot: BotConfig,
    pub dispatcher: DispatcherConfig,
    pub logging: LoggingConfig,
}

/// Telegram bot configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct BotConfig {
    pub token: String,
    /// Users allowed into admin-only commands
    pub admin_ids: Vec<i64>,
}

/// Dispatcher and worker configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatcherConfig {
    pub fallback: FallbackPolicy,
    pub max_stack_depth: usize,
    pub worker_queue_capacity: usize,
    pub worker_idle_timeout_seconds: u64,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            fallback: FallbackPolicy::Ignore,
            max_stack_depth: DEFAULT_MAX_DEPTH,
            worker_queue_capacity: 64,
            worker_idle_timeout_seconds: 300,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `StackBot=debug,teloxide=warn`
    pub level: String,
    /// Directory for daily rolling log files; stdout only when absent
    pub file_path: Option<String>,
    /// Write the file log as JSON lines
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_path: None,
            json: false,
        }
    }
}

impl Settings {
    /// Load settings from `config.toml` (optional) and environment variables
    pub fn new() -> Result<Self> {
        Self::load(config::File::with_name("config").required(false))
    }

    /// Load settings from a specific file plus environment variables
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::load(config::File::from(path.as_ref()))
    }

    /// Parse settings from TOML text, without environment overrides
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    fn load<S>(file: S) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let settings = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("bot.admin_ids")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<()> {
        super::validation::validate_settings(self)
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        self.bot.admin_ids.contains(&user_id)
    }
}
