//! Recording collaborators

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use StackBot::engine::{
    CommandType, DispatchObserver, EventKind, InboundEvent, OutboundEffect, UnhandledReason,
};
use StackBot::transport::MessageSender;
use StackBot::utils::errors::{InvocationError, Result, StackBotError};

/// Sender that keeps every effect it is asked to deliver
#[derive(Debug, Default)]
pub struct RecordingSender {
    effects: Mutex<Vec<OutboundEffect>>,
    fail: bool,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sender that records and then reports a transport failure
    pub fn failing() -> Self {
        Self {
            effects: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn effects(&self) -> Vec<OutboundEffect> {
        self.effects.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.effects()
            .iter()
            .filter_map(|effect| effect.text().map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl MessageSender for RecordingSender {
    async fn send(&self, effect: &OutboundEffect) -> Result<()> {
        self.effects.lock().unwrap().push(effect.clone());
        if self.fail {
            return Err(StackBotError::Transport("recording sender set to fail".to_string()));
        }
        Ok(())
    }
}

/// Observer counting each notification
#[derive(Debug, Default)]
pub struct CountingObserver {
    pub executed: AtomicUsize,
    pub failures: AtomicUsize,
    pub unhandled: AtomicUsize,
    pub last_failure: Mutex<Option<String>>,
}

impl CountingObserver {
    pub fn executed(&self) -> usize {
        self.executed.load(Ordering::SeqCst)
    }

    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::SeqCst)
    }

    pub fn unhandled(&self) -> usize {
        self.unhandled.load(Ordering::SeqCst)
    }
}

impl DispatchObserver for CountingObserver {
    fn on_executed(&self, _event: &InboundEvent, _command: CommandType, _kind: &EventKind) {
        self.executed.fetch_add(1, Ordering::SeqCst);
    }

    fn on_failure(&self, _event: &InboundEvent, error: &InvocationError) {
        self.failures.fetch_add(1, Ordering::SeqCst);
        *self.last_failure.lock().unwrap() = Some(error.to_string());
    }

    fn on_unhandled(&self, _event: &InboundEvent, _reason: &UnhandledReason) {
        self.unhandled.fetch_add(1, Ordering::SeqCst);
    }
}
