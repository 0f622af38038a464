//! Ordered event processing
//!
//! [`BotRuntime`] feeds events to the dispatcher through one worker task per
//! conversation, so events of a conversation are handled in arrival order
//! while different conversations run concurrently. Effects returned by each
//! dispatch are delivered through a [`MessageSender`]. Idle workers exit and
//! are recreated on the next event; a replacement worker waits for the one
//! it replaces, so a conversation never has two workers dispatching.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config::DispatcherConfig;
use crate::engine::dispatcher::Dispatcher;
use crate::engine::event::{ConversationId, InboundEvent};
use crate::transport::MessageSender;
use crate::utils::errors::{Result, StackBotError};

/// Worker queue sizing and lifetime
#[derive(Debug, Clone, Copy)]
pub struct RuntimeOptions {
    pub queue_capacity: usize,
    pub idle_timeout: Duration,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            queue_capacity: 64,
            idle_timeout: Duration::from_secs(300),
        }
    }
}

impl From<&DispatcherConfig> for RuntimeOptions {
    fn from(config: &DispatcherConfig) -> Self {
        Self {
            queue_capacity: config.worker_queue_capacity.max(1),
            idle_timeout: Duration::from_secs(config.worker_idle_timeout_seconds),
        }
    }
}

struct Worker {
    generation: u64,
    queue: mpsc::Sender<InboundEvent>,
    handle: JoinHandle<()>,
    ended: Arc<AtomicBool>,
}

#[derive(Default)]
struct Workers {
    live: HashMap<ConversationId, Worker>,
    /// Workers of ended conversations that may still be finishing an event
    draining: HashMap<ConversationId, JoinHandle<()>>,
}

type WorkerMap = Arc<Mutex<Workers>>;

fn lock_workers(workers: &Mutex<Workers>) -> std::sync::MutexGuard<'_, Workers> {
    workers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Per-conversation workers in front of a [`Dispatcher`]
pub struct BotRuntime {
    dispatcher: Arc<Dispatcher>,
    sender: Arc<dyn MessageSender>,
    workers: WorkerMap,
    options: RuntimeOptions,
    generations: AtomicU64,
}

impl BotRuntime {
    pub fn new(dispatcher: Arc<Dispatcher>, sender: Arc<dyn MessageSender>, options: RuntimeOptions) -> Self {
        Self {
            dispatcher,
            sender,
            workers: Arc::new(Mutex::new(Workers::default())),
            options,
            generations: AtomicU64::new(0),
        }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Queue an event for its conversation's worker
    pub async fn submit(&self, event: InboundEvent) -> Result<()> {
        let conversation_id = event.conversation_id;
        let mut event = event;

        // A worker may retire between lookup and send; the retry starts its successor
        for _ in 0..2 {
            let queue = self.queue_for(conversation_id);
            match queue.send(event).await {
                Ok(()) => return Ok(()),
                Err(mpsc::error::SendError(returned)) => {
                    debug!(conversation_id = %conversation_id, "Worker retired, restarting");
                    event = returned;
                }
            }
        }

        Err(StackBotError::Transport(format!(
            "no worker accepted the event for conversation {}",
            conversation_id
        )))
    }

    /// End a conversation and drop its stack.
    ///
    /// Events queued before the call are discarded; an event already being
    /// dispatched completes without navigation. Events submitted afterwards
    /// start a fresh conversation, handled once the old worker has exited.
    pub fn end_conversation(&self, conversation_id: ConversationId) -> bool {
        {
            let mut workers = lock_workers(&self.workers);
            workers.draining.retain(|_, handle| !handle.is_finished());
            if let Some(worker) = workers.live.remove(&conversation_id) {
                worker.ended.store(true, Ordering::Release);
                drop(worker.queue);
                workers.draining.insert(conversation_id, worker.handle);
            }
        }
        self.dispatcher.end_conversation(conversation_id)
    }

    pub fn active_workers(&self) -> usize {
        lock_workers(&self.workers).live.len()
    }

    /// Stop accepting events and wait for every worker to drain its queue
    pub async fn shutdown(&self) {
        let handles: Vec<JoinHandle<()>> = {
            let mut workers = lock_workers(&self.workers);
            let live: Vec<Worker> = workers.live.drain().map(|(_, worker)| worker).collect();
            info!(workers = live.len(), draining = workers.draining.len(), "Shutting down runtime");

            let mut handles: Vec<JoinHandle<()>> = workers.draining.drain().map(|(_, handle)| handle).collect();
            handles.extend(live.into_iter().map(|worker| {
                drop(worker.queue);
                worker.handle
            }));
            handles
        };

        for result in join_all(handles).await {
            if let Err(e) = result {
                error!(error = %e, "Worker task ended abnormally");
            }
        }
    }

    fn queue_for(&self, conversation_id: ConversationId) -> mpsc::Sender<InboundEvent> {
        let mut workers = lock_workers(&self.workers);
        if let Some(worker) = workers.live.get(&conversation_id) {
            if !worker.queue.is_closed() {
                return worker.queue.clone();
            }
        }

        // The new worker starts only after its predecessor has exited
        let previous = match workers.live.remove(&conversation_id) {
            Some(worker) => Some(worker.handle),
            None => workers.draining.remove(&conversation_id),
        };

        let generation = self.generations.fetch_add(1, Ordering::Relaxed);
        let ended = Arc::new(AtomicBool::new(false));
        let (queue, receiver) = mpsc::channel(self.options.queue_capacity);
        let handle = tokio::spawn(run_worker(WorkerTask {
            conversation_id,
            generation,
            previous,
            receiver,
            ended: ended.clone(),
            dispatcher: self.dispatcher.clone(),
            sender: self.sender.clone(),
            workers: self.workers.clone(),
            idle_timeout: self.options.idle_timeout,
        }));
        debug!(conversation_id = %conversation_id, generation, "Started conversation worker");

        workers.live.insert(
            conversation_id,
            Worker {
                generation,
                queue: queue.clone(),
                handle,
                ended,
            },
        );
        queue
    }
}

struct WorkerTask {
    conversation_id: ConversationId,
    generation: u64,
    previous: Option<JoinHandle<()>>,
    receiver: mpsc::Receiver<InboundEvent>,
    ended: Arc<AtomicBool>,
    dispatcher: Arc<Dispatcher>,
    sender: Arc<dyn MessageSender>,
    workers: WorkerMap,
    idle_timeout: Duration,
}

async fn run_worker(task: WorkerTask) {
    let WorkerTask {
        conversation_id,
        generation,
        previous,
        mut receiver,
        ended,
        dispatcher,
        sender,
        workers,
        idle_timeout,
    } = task;

    if let Some(previous) = previous {
        if let Err(e) = previous.await {
            error!(conversation_id = %conversation_id, error = %e, "Previous worker ended abnormally");
        }
    }

    loop {
        match tokio::time::timeout(idle_timeout, receiver.recv()).await {
            Ok(Some(event)) => handle(&ended, &dispatcher, sender.as_ref(), event).await,
            Ok(None) => break,
            Err(_) => {
                debug!(conversation_id = %conversation_id, "Worker idle, retiring");
                break;
            }
        }
    }

    // Close first so new events go to a successor, which waits for this
    // task; events accepted before the close are still handled here
    receiver.close();
    while let Ok(event) = receiver.try_recv() {
        handle(&ended, &dispatcher, sender.as_ref(), event).await;
    }

    let mut map = lock_workers(&workers);
    if map
        .live
        .get(&conversation_id)
        .is_some_and(|worker| worker.generation == generation)
    {
        map.live.remove(&conversation_id);
    }
}

async fn handle(ended: &AtomicBool, dispatcher: &Dispatcher, sender: &dyn MessageSender, event: InboundEvent) {
    if ended.load(Ordering::Acquire) {
        debug!(conversation_id = %event.conversation_id, "Conversation ended, dropping queued event");
        return;
    }
    process(dispatcher, sender, event).await;
}

async fn process(dispatcher: &Dispatcher, sender: &dyn MessageSender, event: InboundEvent) {
    let conversation_id = event.conversation_id;
    let outcome = dispatcher.dispatch(event).await;

    for effect in outcome.into_effects() {
        if let Err(e) = sender.send(&effect).await {
            error!(conversation_id = %conversation_id, error = %e, "Failed to deliver effect");
        }
    }
}
