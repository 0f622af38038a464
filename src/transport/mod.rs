//! Delivery of outbound effects
//!
//! The engine only produces [`OutboundEffect`] values; a [`MessageSender`]
//! turns them into platform calls.

pub mod telegram;

use async_trait::async_trait;

use crate::engine::effects::OutboundEffect;
use crate::utils::errors::Result;

pub use telegram::TelegramSender;

/// Executes outbound effects against a messaging platform
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, effect: &OutboundEffect) -> Result<()>;
}

/// Sender that only logs, used when no platform is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingSender;

#[async_trait]
impl MessageSender for LoggingSender {
    async fn send(&self, effect: &OutboundEffect) -> Result<()> {
        tracing::info!(
            conversation_id = %effect.conversation_id(),
            text = effect.text(),
            "Outbound effect"
        );
        Ok(())
    }
}
