//! StackBot demo bot
//!
//! Main application entry point

use std::sync::Arc;

use anyhow::Context;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::Update;
use tracing::{error, info, warn};

use StackBot::{
    config::Settings,
    engine::{BotRuntime, Dispatcher, HandlerRegistry, RuntimeOptions},
    handlers::{register_all, MainMenuCommand},
    transport::{telegram, TelegramSender},
    utils::logging,
};

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Admin ids shared with the update handlers
#[derive(Clone)]
struct AdminIds(Arc<Vec<i64>>);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new().context("failed to load settings")?;
    settings.validate().context("invalid settings")?;

    // Initialize logging
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", StackBot::info());

    let mut registry = HandlerRegistry::new();
    register_all(&mut registry)?;

    let dispatcher = Dispatcher::builder(registry)
        .root(MainMenuCommand::default)
        .with_config(&settings.dispatcher)
        .build()?;

    let bot = Bot::new(&settings.bot.token);
    let runtime = Arc::new(BotRuntime::new(
        Arc::new(dispatcher),
        Arc::new(TelegramSender::new(bot.clone())),
        RuntimeOptions::from(&settings.dispatcher),
    ));
    let admin_ids = AdminIds(Arc::new(settings.bot.admin_ids.clone()));

    let mut updates = teloxide::dispatching::Dispatcher::builder(bot, create_handler())
        .dependencies(dptree::deps![runtime.clone(), admin_ids])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd.id);
        })
        .enable_ctrlc_handler()
        .build();

    info!("Starting bot with polling mode...");
    updates.dispatch().await;

    runtime.shutdown().await;
    info!("StackBot has been shut down.");
    Ok(())
}

/// Create the main update handler
fn create_handler() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    use teloxide::dispatching::UpdateFilterExt;

    dptree::entry()
        .branch(Update::filter_message().endpoint(handle_message))
        .branch(Update::filter_callback_query().endpoint(handle_callback))
}

/// Forward text messages to the runtime
async fn handle_message(msg: Message, runtime: Arc<BotRuntime>, admin_ids: AdminIds) -> HandlerResult {
    let Some(event) = telegram::message_to_event(&msg, &admin_ids.0) else {
        return Ok(());
    };

    if let Err(e) = runtime.submit(event).await {
        error!(chat_id = msg.chat.id.0, error = %e, "Failed to queue message");
    }
    Ok(())
}

/// Answer the query and forward its data to the runtime
async fn handle_callback(
    bot: Bot,
    query: CallbackQuery,
    runtime: Arc<BotRuntime>,
    admin_ids: AdminIds,
) -> HandlerResult {
    if let Err(e) = bot.answer_callback_query(query.id.clone()).await {
        warn!(error = %e, callback_id = %query.id, "Failed to answer callback query");
    }

    let Some(event) = telegram::callback_to_event(&query, &admin_ids.0) else {
        return Ok(());
    };

    if let Err(e) = runtime.submit(event).await {
        error!(user_id = query.from.id.0, error = %e, "Failed to queue callback");
    }
    Ok(())
}
