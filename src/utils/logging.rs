//! Logging configuration and setup
//!
//! Subscriber initialisation plus structured logging helpers used by the
//! dispatcher.

use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use crate::config::LoggingConfig;
use crate::engine::event::{ConversationId, EventKind};
use crate::engine::navigation::NavigationResult;
use crate::utils::errors::{InvocationError, Result, StackBotError};

const LOG_FILE_PREFIX: &str = "stackbot.log";

/// Initialize logging based on configuration.
///
/// Returns the file writer guard when a file layer is configured; keep it
/// alive for the lifetime of the program or buffered lines are lost.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_new(&config.level)
        .map_err(|e| StackBotError::Config(format!("Invalid log level '{}': {}", config.level, e)))?;

    let stdout_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stdout);

    let (file_layer, guard) = match &config.file_path {
        Some(directory) => {
            let file_appender = tracing_appender::rolling::daily(directory, LOG_FILE_PREFIX);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = if config.json {
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(non_blocking)
                    .boxed()
            } else {
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(non_blocking)
                    .boxed()
            };
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| StackBotError::Config(format!("Logging already initialized: {}", e)))?;

    info!(
        level = %config.level,
        file = config.file_path.as_deref().unwrap_or("none"),
        "Logging initialized"
    );
    Ok(guard)
}

/// Log the outcome of one dispatched event
pub fn log_dispatch(conversation_id: ConversationId, kind: &EventKind, outcome: &str) {
    debug!(
        conversation_id = %conversation_id,
        kind = %kind,
        outcome = outcome,
        "Event dispatched"
    );
}

/// Log an applied or rejected navigation
pub fn log_navigation(conversation_id: ConversationId, directive: &str, result: &NavigationResult) {
    match result {
        NavigationResult::Rejected(reason) => warn!(
            conversation_id = %conversation_id,
            directive = directive,
            reason = %reason,
            "Navigation rejected"
        ),
        NavigationResult::Discarded => warn!(
            conversation_id = %conversation_id,
            directive = directive,
            "Navigation discarded"
        ),
        other => info!(
            conversation_id = %conversation_id,
            directive = directive,
            result = ?other,
            "Navigation applied"
        ),
    }
}

/// Log a handler failure that was rolled back
pub fn log_invocation_failure(conversation_id: ConversationId, failure: &InvocationError) {
    error!(
        conversation_id = %conversation_id,
        command = %failure.command(),
        error = %failure,
        "Handler failed, changes rolled back"
    );
}
