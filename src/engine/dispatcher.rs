//! Event dispatcher
//!
//! Routes each inbound event to the handler of the conversation's current
//! command, runs it behind a failure boundary and applies the navigation it
//! asks for. Conversations are independent: each one has its own slot with
//! its own lock, so only events of the same conversation wait for each other.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::DispatcherConfig;
use crate::engine::binder;
use crate::engine::command::{Command, CommandType, EmptyCommand};
use crate::engine::context::CommandContext;
use crate::engine::data::ConversationData;
use crate::engine::effects::OutboundEffect;
use crate::engine::event::{ConversationId, EventKind, InboundEvent, Payload};
use crate::engine::navigation::{NavigationDirective, NavigationResult};
use crate::engine::observer::{DispatchObserver, TracingObserver};
use crate::engine::outcome::{DispatchOutcome, DispatchReport, UnhandledReason};
use crate::engine::registry::{CommandFactory, CommandSpec, HandlerRegistry};
use crate::engine::stack::{ContextStack, EntrySnapshot, DEFAULT_MAX_DEPTH};
use crate::engine::system::{self, SubCommand, SystemInput};
use crate::utils::errors::{panic_message, InvocationError, NavigationError, RegistrationError};
use crate::utils::logging::{log_dispatch, log_invocation_failure, log_navigation};

/// What happens to events the current command does not handle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackPolicy {
    /// Report the event as unhandled
    #[default]
    Ignore,
    /// Offer the event to the root command
    Root,
}

#[derive(Debug)]
struct ConversationState {
    stack: ContextStack,
    data: ConversationData,
}

#[derive(Debug)]
struct ConversationSlot {
    state: tokio::sync::Mutex<ConversationState>,
    closed: AtomicBool,
}

impl ConversationSlot {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// A handler that ran and accepted the event. Its changes are committed;
/// `undo` holds what they replaced.
struct Invocation {
    command: CommandType,
    kind: EventKind,
    directive: NavigationDirective,
    effects: Vec<OutboundEffect>,
    undo: Undo,
}

struct Undo {
    index: usize,
    command: Option<Box<dyn Command>>,
    data: ConversationData,
    menu: Option<Vec<Vec<SubCommand>>>,
}

impl Undo {
    /// Put back the entry state and data bag replaced by a commit. Only valid
    /// while the stack still has the shape it had at commit time.
    fn restore(self, state: &mut ConversationState) {
        if let Some(command) = self.command {
            state.stack.commit_at(self.index, command);
        }
        if let Some(menu) = self.menu {
            state.stack.set_menu_at(self.index, menu);
        }
        state.data = self.data;
    }
}

/// Builder for [`Dispatcher`]
pub struct DispatcherBuilder {
    registry: HandlerRegistry,
    root: Option<(CommandType, CommandFactory)>,
    observer: Arc<dyn DispatchObserver>,
    fallback: FallbackPolicy,
    max_depth: usize,
}

impl DispatcherBuilder {
    fn new(registry: HandlerRegistry) -> Self {
        Self {
            registry,
            root: None,
            observer: Arc::new(TracingObserver),
            fallback: FallbackPolicy::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Root command of every new conversation, created with `factory`
    pub fn root<C, F>(mut self, factory: F) -> Self
    where
        C: Command,
        F: Fn() -> C + Send + Sync + 'static,
    {
        let factory: CommandFactory = Arc::new(move || Box::new(factory()) as Box<dyn Command>);
        self.root = Some((CommandType::of::<C>(), factory));
        self
    }

    pub fn observer(mut self, observer: Arc<dyn DispatchObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Apply the `dispatcher` section of the settings
    pub fn with_config(self, config: &DispatcherConfig) -> Self {
        self.fallback(config.fallback).max_depth(config.max_stack_depth)
    }

    /// Validate the root and freeze the registry
    pub fn build(mut self) -> Result<Dispatcher, RegistrationError> {
        let (root, root_factory) = match self.root.take() {
            Some(root) => root,
            None => {
                self.registry.register(CommandSpec::<EmptyCommand>::new().default_factory())?;
                let factory: CommandFactory = Arc::new(|| Box::new(EmptyCommand) as Box<dyn Command>);
                (CommandType::of::<EmptyCommand>(), factory)
            }
        };

        if !self.registry.contains(root) {
            return Err(RegistrationError::UnregisteredRoot { command: root });
        }
        if self.registry.resolve(root, &EventKind::Text).is_none() {
            warn!(command = %root, "Root command has no text handler, plain messages will go unhandled");
        }

        info!(
            root = %root,
            commands = self.registry.len(),
            fallback = ?self.fallback,
            max_depth = self.max_depth,
            "Dispatcher ready"
        );

        Ok(Dispatcher {
            registry: Arc::new(self.registry),
            root,
            root_factory,
            conversations: Mutex::new(HashMap::new()),
            observer: self.observer,
            fallback: self.fallback,
            max_depth: self.max_depth,
        })
    }
}

/// Routes events to the current command of their conversation
pub struct Dispatcher {
    registry: Arc<HandlerRegistry>,
    root: CommandType,
    root_factory: CommandFactory,
    conversations: Mutex<HashMap<ConversationId, Arc<ConversationSlot>>>,
    observer: Arc<dyn DispatchObserver>,
    fallback: FallbackPolicy,
    max_depth: usize,
}

impl Dispatcher {
    pub fn builder(registry: HandlerRegistry) -> DispatcherBuilder {
        DispatcherBuilder::new(registry)
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn root(&self) -> CommandType {
        self.root
    }

    pub fn fallback(&self) -> FallbackPolicy {
        self.fallback
    }

    /// Process one event to completion.
    ///
    /// Events of the same conversation are processed one at a time; events of
    /// different conversations run in parallel.
    pub async fn dispatch(&self, event: InboundEvent) -> DispatchOutcome {
        let outcome = loop {
            let slot = self.slot(event.conversation_id);
            let mut state = slot.state.lock().await;
            // Ended while we waited for the lock; a fresh slot replaces it
            if slot.is_closed() {
                continue;
            }
            break self.process(&slot, &mut state, &event).await;
        };

        if let DispatchOutcome::Unhandled(reason) = &outcome {
            self.observer.on_unhandled(&event, reason);
        }
        log_dispatch(event.conversation_id, &event.kind, outcome.label());
        outcome
    }

    /// Drop the conversation's stack and data. A dispatch already running
    /// for it completes, but its navigation is discarded.
    pub fn end_conversation(&self, conversation_id: ConversationId) -> bool {
        let removed = self.conversations_lock().remove(&conversation_id);
        match removed {
            Some(slot) => {
                slot.closed.store(true, Ordering::Release);
                info!(conversation_id = %conversation_id, "Conversation ended");
                true
            }
            None => false,
        }
    }

    pub fn conversation_count(&self) -> usize {
        self.conversations_lock().len()
    }

    pub fn has_conversation(&self, conversation_id: ConversationId) -> bool {
        self.conversations_lock().contains_key(&conversation_id)
    }

    /// Structural view of a conversation's stack, bottom to top
    pub async fn snapshot(&self, conversation_id: ConversationId) -> Option<Vec<EntrySnapshot>> {
        let slot = self.existing_slot(conversation_id)?;
        let state = slot.state.lock().await;
        Some(state.stack.snapshot())
    }

    pub async fn current_command(&self, conversation_id: ConversationId) -> Option<CommandType> {
        let slot = self.existing_slot(conversation_id)?;
        let state = slot.state.lock().await;
        Some(state.stack.current().command_type())
    }

    /// Copy of a conversation's data bag
    pub async fn conversation_data(&self, conversation_id: ConversationId) -> Option<ConversationData> {
        let slot = self.existing_slot(conversation_id)?;
        let state = slot.state.lock().await;
        Some(state.data.clone())
    }

    fn conversations_lock(&self) -> std::sync::MutexGuard<'_, HashMap<ConversationId, Arc<ConversationSlot>>> {
        // Nothing panics while the map is held, a poisoned lock is still consistent
        self.conversations.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn existing_slot(&self, conversation_id: ConversationId) -> Option<Arc<ConversationSlot>> {
        self.conversations_lock().get(&conversation_id).cloned()
    }

    fn slot(&self, conversation_id: ConversationId) -> Arc<ConversationSlot> {
        let mut conversations = self.conversations_lock();
        conversations
            .entry(conversation_id)
            .or_insert_with(|| {
                debug!(conversation_id = %conversation_id, root = %self.root, "Starting conversation");
                Arc::new(ConversationSlot {
                    state: tokio::sync::Mutex::new(ConversationState {
                        stack: ContextStack::with_max_depth((self.root_factory)(), self.max_depth),
                        data: ConversationData::new(conversation_id),
                    }),
                    closed: AtomicBool::new(false),
                })
            })
            .clone()
    }

    async fn process(&self, slot: &ConversationSlot, state: &mut ConversationState, event: &InboundEvent) -> DispatchOutcome {
        let selected = system::find_selected(state.stack.current().menu(), event)
            .map(|entry| (entry.system_input(), entry.target, entry.state.clone()));

        // Raw `_BACK`/`_REFRESH`, or a system entry chosen by its title
        let system_input = SystemInput::parse(event).or_else(|| selected.as_ref().and_then(|(input, _, _)| *input));
        if let Some(input) = system_input {
            return match input {
                SystemInput::Back => self.go_back(slot, state, event).await,
                SystemInput::Refresh => self.refresh_current(slot, state, event).await,
            };
        }

        if let Some((_, Some(target), entry_state)) = selected {
            return self.enter_sub_command(slot, state, event, target, entry_state).await;
        }

        let current = state.stack.depth() - 1;
        match self.run_handler(state, event, current).await {
            Ok(invocation) => self.finish(slot, state, event, invocation, NavigationResult::Unchanged, false),
            Err(DispatchOutcome::Unhandled(reason)) if self.fallback == FallbackPolicy::Root && current > 0 => {
                debug!(
                    conversation_id = %event.conversation_id,
                    reason = ?reason,
                    "Offering event to the root command"
                );
                match self.run_handler(state, event, 0).await {
                    Ok(invocation) => self.finish(slot, state, event, invocation, NavigationResult::Unchanged, true),
                    Err(DispatchOutcome::Unhandled(_)) => DispatchOutcome::Unhandled(reason),
                    Err(other) => other,
                }
            }
            Err(other) => other,
        }
    }

    /// `_BACK`: refresh the previous command, then pop the current one.
    /// On the root only the refresh happens.
    async fn go_back(&self, slot: &ConversationSlot, state: &mut ConversationState, event: &InboundEvent) -> DispatchOutcome {
        if state.stack.is_at_root() {
            debug!(conversation_id = %event.conversation_id, "Back on the root command, refreshing instead");
            return self.refresh_current(slot, state, event).await;
        }

        let refresh = event.derive(EventKind::Refresh, Payload::Empty);
        let previous = state.stack.depth() - 2;
        let previous_type = state.stack.command_types()[previous];

        let invocation = match self.run_handler(state, &refresh, previous).await {
            Ok(invocation) => Some(invocation),
            Err(DispatchOutcome::Unhandled(_)) => None,
            Err(other) => return other,
        };

        if slot.is_closed() {
            return DispatchOutcome::Handled(DispatchReport {
                command: previous_type,
                kind: EventKind::Refresh,
                effects: invocation.map(|inv| inv.effects).unwrap_or_default(),
                navigation: NavigationResult::Discarded,
                fallback: false,
            });
        }

        let (taken, popped) = match state.stack.take_top() {
            Ok(entry) => {
                let popped = NavigationResult::Popped {
                    removed: entry.command_type(),
                    current: state.stack.current().command_type(),
                };
                (Some(entry), popped)
            }
            Err(NavigationError::LeaveFailed { command, message }) => {
                if let Some(invocation) = invocation {
                    invocation.undo.restore(state);
                }
                return self.fail(event, InvocationError::LeaveFailed { command, message });
            }
            Err(err) => (None, NavigationResult::Rejected(err)),
        };
        log_navigation(event.conversation_id, "pop", &popped);

        let outcome = match invocation {
            Some(invocation) => self.finish(slot, state, &refresh, invocation, popped, false),
            None => DispatchOutcome::Handled(DispatchReport {
                command: previous_type,
                kind: EventKind::Refresh,
                effects: Vec::new(),
                navigation: popped,
                fallback: false,
            }),
        };

        if let (DispatchOutcome::Failed(_), Some(entry)) = (&outcome, taken) {
            state.stack.restore_top(entry);
        }
        outcome
    }

    /// `_REFRESH`: send `Refresh` to the current command
    async fn refresh_current(
        &self,
        slot: &ConversationSlot,
        state: &mut ConversationState,
        event: &InboundEvent,
    ) -> DispatchOutcome {
        let refresh = event.derive(EventKind::Refresh, Payload::Empty);
        let current = state.stack.depth() - 1;
        let current_type = state.stack.current().command_type();

        match self.run_handler(state, &refresh, current).await {
            Ok(invocation) => self.finish(slot, state, &refresh, invocation, NavigationResult::Unchanged, false),
            Err(DispatchOutcome::Unhandled(UnhandledReason::NoHandler { .. })) => DispatchOutcome::Handled(DispatchReport {
                command: current_type,
                kind: EventKind::Refresh,
                effects: Vec::new(),
                navigation: NavigationResult::Unchanged,
                fallback: false,
            }),
            Err(other) => other,
        }
    }

    /// A menu entry targeting `target` was chosen: push an instance built
    /// from the entry's state and send it `Refresh`. If the refresh fails the
    /// push is undone.
    async fn enter_sub_command(
        &self,
        slot: &ConversationSlot,
        state: &mut ConversationState,
        event: &InboundEvent,
        target: CommandType,
        entry_state: Option<serde_json::Value>,
    ) -> DispatchOutcome {
        let current_type = state.stack.current().command_type();
        let rejected = |err: NavigationError| {
            log_navigation(event.conversation_id, "push", &NavigationResult::Rejected(err.clone()));
            DispatchOutcome::Handled(DispatchReport {
                command: current_type,
                kind: event.kind.clone(),
                effects: Vec::new(),
                navigation: NavigationResult::Rejected(err),
                fallback: false,
            })
        };

        if self.registry.is_admin_only(target) && !event.sender.is_admin {
            return DispatchOutcome::Denied { command: target };
        }

        let instance = match self.registry.instantiate(target, entry_state.as_ref()) {
            Ok(instance) => instance,
            Err(err) => return rejected(err),
        };
        if let Err(err) = state.stack.push(instance) {
            return rejected(err);
        }
        let pushed = NavigationResult::Pushed { current: target };
        log_navigation(event.conversation_id, "push", &pushed);

        let refresh = event.derive(EventKind::Refresh, Payload::Empty);
        let top = state.stack.depth() - 1;
        let outcome = match self.run_handler(state, &refresh, top).await {
            Ok(invocation) => self.finish(slot, state, &refresh, invocation, pushed, false),
            Err(DispatchOutcome::Unhandled(_)) => DispatchOutcome::Handled(DispatchReport {
                command: target,
                kind: EventKind::Refresh,
                effects: Vec::new(),
                navigation: pushed,
                fallback: false,
            }),
            Err(other) => other,
        };

        if matches!(outcome, DispatchOutcome::Failed(_) | DispatchOutcome::Denied { .. })
            && state.stack.discard_top().is_some()
        {
            debug!(conversation_id = %event.conversation_id, command = %target, "Undid push after failed refresh");
        }
        outcome
    }

    /// Resolve, bind and invoke the handler of the entry at `index`.
    ///
    /// The handler body runs on the blocking pool, on clones of the command
    /// and the data bag. They are committed only when it returns `Ok`; the
    /// returned invocation keeps what they replaced. Every early return is
    /// the final outcome for this entry.
    async fn run_handler(
        &self,
        state: &mut ConversationState,
        event: &InboundEvent,
        index: usize,
    ) -> Result<Invocation, DispatchOutcome> {
        let Some(entry) = state.stack.entry(index) else {
            return Err(DispatchOutcome::Unhandled(UnhandledReason::NoHandler {
                command: state.stack.current().command_type(),
                kind: event.kind.clone(),
            }));
        };
        let command_type = entry.command_type();

        let descriptor = self.registry.resolve(command_type, &event.kind).ok_or_else(|| {
            DispatchOutcome::Unhandled(UnhandledReason::NoHandler {
                command: command_type,
                kind: event.kind.clone(),
            })
        })?;

        let args = binder::bind(descriptor.shape(), event, &state.data).map_err(|cause| {
            DispatchOutcome::Unhandled(UnhandledReason::Unbindable {
                command: command_type,
                cause,
            })
        })?;

        if self.registry.is_admin_only(command_type) && !event.sender.is_admin {
            warn!(
                conversation_id = %event.conversation_id,
                user_id = event.sender.user_id,
                command = %command_type,
                "Admin-only command denied"
            );
            return Err(DispatchOutcome::Denied { command: command_type });
        }

        let working = entry.command().clone_box();
        let mut visible = state.stack.command_types();
        visible.truncate(index + 1);
        let ctx = CommandContext::new(event.clone(), command_type, entry.instance_id(), visible, state.data.clone());
        let handler = descriptor.handler();

        let joined = tokio::task::spawn_blocking(move || {
            let mut working = working;
            let mut ctx = ctx;
            let result = handler(working.as_mut(), &args, &mut ctx);
            (working, ctx, result)
        })
        .await;

        let failure = match joined {
            Ok((working, ctx, Ok(reply))) => {
                let parts = ctx.into_parts();
                let undo = Undo {
                    index,
                    command: state.stack.commit_at(index, working),
                    data: std::mem::replace(&mut state.data, parts.data),
                    menu: parts.menu.and_then(|menu| state.stack.set_menu_at(index, menu)),
                };

                if !reply.handled {
                    return Err(DispatchOutcome::Unhandled(UnhandledReason::Declined { command: command_type }));
                }
                return Ok(Invocation {
                    command: command_type,
                    kind: event.kind.clone(),
                    directive: reply.directive,
                    effects: parts.effects,
                    undo,
                });
            }
            Ok((_, _, Err(source))) => InvocationError::Handler {
                command: command_type,
                kind: event.kind.clone(),
                source,
            },
            Err(e) if e.is_panic() => InvocationError::Panicked {
                command: command_type,
                kind: event.kind.clone(),
                message: panic_message(e.into_panic().as_ref()),
            },
            Err(e) => InvocationError::Aborted {
                command: command_type,
                kind: event.kind.clone(),
                reason: e.to_string(),
            },
        };

        Err(self.fail(event, failure))
    }

    fn fail(&self, event: &InboundEvent, failure: InvocationError) -> DispatchOutcome {
        log_invocation_failure(event.conversation_id, &failure);
        self.observer.on_failure(event, &failure);
        DispatchOutcome::Failed(failure)
    }

    /// Apply the handler's directive and build the outcome. `base` is the
    /// navigation already performed for this event, kept when the handler
    /// asked for none. A panicking leave hook undoes the invocation.
    fn finish(
        &self,
        slot: &ConversationSlot,
        state: &mut ConversationState,
        event: &InboundEvent,
        invocation: Invocation,
        base: NavigationResult,
        fallback: bool,
    ) -> DispatchOutcome {
        let Invocation {
            command,
            kind,
            directive,
            effects,
            undo,
        } = invocation;
        let label = directive.label();

        let navigation = if directive.is_none() {
            base
        } else if slot.is_closed() {
            warn!(
                conversation_id = %event.conversation_id,
                directive = label,
                "Conversation ended during dispatch, directive discarded"
            );
            NavigationResult::Discarded
        } else {
            match self.apply(&mut state.stack, directive) {
                NavigationResult::Rejected(NavigationError::LeaveFailed { command: leaving, message }) => {
                    undo.restore(state);
                    return self.fail(event, InvocationError::LeaveFailed { command: leaving, message });
                }
                result => {
                    log_navigation(event.conversation_id, label, &result);
                    result
                }
            }
        };

        self.observer.on_executed(event, command, &kind);
        DispatchOutcome::Handled(DispatchReport {
            command,
            kind,
            effects,
            navigation,
            fallback,
        })
    }

    fn apply(&self, stack: &mut ContextStack, directive: NavigationDirective) -> NavigationResult {
        match directive {
            NavigationDirective::None => NavigationResult::Unchanged,
            NavigationDirective::Push(command) => {
                let command_type = command.command_type();
                if !self.registry.contains(command_type) {
                    return NavigationResult::Rejected(NavigationError::UnregisteredCommand { command: command_type });
                }
                match stack.push(command) {
                    Ok(_) => NavigationResult::Pushed { current: command_type },
                    Err(err) => NavigationResult::Rejected(err),
                }
            }
            NavigationDirective::Pop => match stack.pop() {
                Ok(removed) => NavigationResult::Popped {
                    removed,
                    current: stack.current().command_type(),
                },
                Err(err) => NavigationResult::Rejected(err),
            },
            NavigationDirective::Replace(command) => {
                let command_type = command.command_type();
                if !self.registry.contains(command_type) {
                    return NavigationResult::Rejected(NavigationError::UnregisteredCommand { command: command_type });
                }
                match stack.replace(command) {
                    Ok(removed) => NavigationResult::Replaced {
                        removed,
                        current: command_type,
                    },
                    Err(err) => NavigationResult::Rejected(err),
                }
            }
            NavigationDirective::Reset => match stack.reset() {
                Ok(removed) => NavigationResult::Reset { removed },
                Err(err) => NavigationResult::Rejected(err),
            },
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("root", &self.root)
            .field("registry", &self.registry)
            .field("fallback", &self.fallback)
            .field("max_depth", &self.max_depth)
            .field("conversations", &self.conversation_count())
            .finish_non_exhaustive()
    }
}
