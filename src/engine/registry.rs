//! Handler registry
//!
//! Command types declare their handlers explicitly through a [`CommandSpec`]:
//! a list of `event kind → handler` pairs plus the parameter shape each
//! handler expects. The registry validates the declarations once, at startup,
//! and is read-only afterwards.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::engine::binder::{BoundArgs, Param, ParamShape};
use crate::engine::command::{Command, CommandType};
use crate::engine::context::CommandContext;
use crate::engine::event::EventKind;
use crate::engine::navigation::Reply;
use crate::utils::errors::{HandlerError, HandlerResult, NavigationError, RegistrationError};

/// Type-erased handler callable
pub type HandlerFn =
    Arc<dyn Fn(&mut dyn Command, &BoundArgs, &mut CommandContext) -> HandlerResult<Reply> + Send + Sync>;

/// Creates fresh instances of a command type
pub type CommandFactory = Arc<dyn Fn() -> Box<dyn Command> + Send + Sync>;

/// Creates instances entered from a menu, given the entry's initial state
pub type EntryFactory =
    Arc<dyn Fn(Option<&serde_json::Value>) -> Result<Box<dyn Command>, String> + Send + Sync>;

/// Static metadata of one handler, shared by all instances of its command
pub struct HandlerDescriptor {
    command: CommandType,
    kind: EventKind,
    name: String,
    shape: ParamShape,
    handler: HandlerFn,
}

impl HandlerDescriptor {
    pub fn command(&self) -> CommandType {
        self.command
    }

    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    /// Handler name used in logs
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> &ParamShape {
        &self.shape
    }

    /// Call the handler on `command`
    pub fn invoke(
        &self,
        command: &mut dyn Command,
        args: &BoundArgs,
        ctx: &mut CommandContext,
    ) -> HandlerResult<Reply> {
        (self.handler)(command, args, ctx)
    }

    /// Shared handle on the handler, for running it off the async threads
    pub(crate) fn handler(&self) -> HandlerFn {
        self.handler.clone()
    }
}

impl fmt::Debug for HandlerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerDescriptor")
            .field("command", &self.command)
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("shape", &self.shape)
            .finish_non_exhaustive()
    }
}

struct DeclaredHandler {
    kind: EventKind,
    name: String,
    shape: ParamShape,
    handler: HandlerFn,
}

/// Declarative list of handlers for command type `C`
pub struct CommandSpec<C> {
    handlers: Vec<DeclaredHandler>,
    admin_only: bool,
    factory: Option<EntryFactory>,
    _command: PhantomData<fn() -> C>,
}

impl<C: Command> CommandSpec<C> {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            admin_only: false,
            factory: None,
            _command: PhantomData,
        }
    }

    /// Declare the handler for `kind`
    pub fn on<F>(self, kind: EventKind, shape: impl Into<ParamShape>, handler: F) -> Self
    where
        F: Fn(&mut C, &BoundArgs, &mut CommandContext) -> HandlerResult<Reply> + Send + Sync + 'static,
    {
        let name = format!("{}::{}", CommandType::of::<C>().name(), kind);
        self.on_named(name, kind, shape, handler)
    }

    /// Declare the handler for `kind` with an explicit name for logs
    pub fn on_named<F>(mut self, name: impl Into<String>, kind: EventKind, shape: impl Into<ParamShape>, handler: F) -> Self
    where
        F: Fn(&mut C, &BoundArgs, &mut CommandContext) -> HandlerResult<Reply> + Send + Sync + 'static,
    {
        self.handlers.push(DeclaredHandler {
            kind,
            name: name.into(),
            shape: shape.into(),
            handler: erase(handler),
        });
        self
    }

    /// Text handler receiving the message text
    pub fn on_text<F>(self, handler: F) -> Self
    where
        F: Fn(&mut C, &BoundArgs, &mut CommandContext) -> HandlerResult<Reply> + Send + Sync + 'static,
    {
        self.on(EventKind::Text, [Param::Text], handler)
    }

    /// Bot command handler receiving the command name and its arguments
    pub fn on_command<F>(self, handler: F) -> Self
    where
        F: Fn(&mut C, &BoundArgs, &mut CommandContext) -> HandlerResult<Reply> + Send + Sync + 'static,
    {
        self.on(EventKind::Command, [Param::CommandName, Param::Text], handler)
    }

    /// Callback handler receiving the button data
    pub fn on_callback<F>(self, handler: F) -> Self
    where
        F: Fn(&mut C, &BoundArgs, &mut CommandContext) -> HandlerResult<Reply> + Send + Sync + 'static,
    {
        self.on(EventKind::Callback, [Param::CallbackData], handler)
    }

    /// Refresh handler, called when the command becomes current again
    pub fn on_refresh<F>(self, handler: F) -> Self
    where
        F: Fn(&mut C, &BoundArgs, &mut CommandContext) -> HandlerResult<Reply> + Send + Sync + 'static,
    {
        self.on(EventKind::Refresh, ParamShape::empty(), handler)
    }

    /// Only admins may interact with this command
    pub fn admin_only(mut self) -> Self {
        self.admin_only = true;
        self
    }

    /// Factory used when the command is entered from a menu. Any state
    /// attached to the menu entry is ignored.
    pub fn factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> C + Send + Sync + 'static,
    {
        self.factory = Some(Arc::new(move |_: Option<&serde_json::Value>| {
            Ok(Box::new(factory()) as Box<dyn Command>)
        }));
        self
    }

    /// Factory receiving the state attached to the chosen menu entry,
    /// decoded as `T`; `None` when the entry carries no state
    pub fn state_factory<T, F>(mut self, factory: F) -> Self
    where
        T: DeserializeOwned,
        F: Fn(Option<T>) -> C + Send + Sync + 'static,
    {
        self.factory = Some(Arc::new(move |state: Option<&serde_json::Value>| {
            let state = state
                .map(|value| serde_json::from_value::<T>(value.clone()))
                .transpose()
                .map_err(|e| e.to_string())?;
            Ok(Box::new(factory(state)) as Box<dyn Command>)
        }));
        self
    }
}

impl<C: Command + Default> CommandSpec<C> {
    /// Use `C::default()` as the factory
    pub fn default_factory(self) -> Self {
        self.factory(C::default)
    }
}

impl<C: Command> Default for CommandSpec<C> {
    fn default() -> Self {
        Self::new()
    }
}

fn erase<C, F>(handler: F) -> HandlerFn
where
    C: Command,
    F: Fn(&mut C, &BoundArgs, &mut CommandContext) -> HandlerResult<Reply> + Send + Sync + 'static,
{
    Arc::new(move |command: &mut dyn Command, args: &BoundArgs, ctx: &mut CommandContext| {
        let actual = command.command_type();
        let command = command.downcast_mut::<C>().ok_or_else(|| {
            HandlerError::msg(format!(
                "handler for {} called on {}",
                CommandType::of::<C>(),
                actual
            ))
        })?;
        handler(command, args, ctx)
    })
}

struct RegisteredCommand {
    command: CommandType,
    handlers: HashMap<EventKind, Arc<HandlerDescriptor>>,
    admin_only: bool,
    factory: Option<EntryFactory>,
}

impl RegisteredCommand {
    fn signature(&self) -> (HashSet<(EventKind, ParamShape)>, bool, bool) {
        let handlers = self
            .handlers
            .values()
            .map(|d| (d.kind.clone(), d.shape.clone()))
            .collect();
        (handlers, self.admin_only, self.factory.is_some())
    }
}

/// Lookup table from `(command type, event kind)` to handler
#[derive(Default)]
pub struct HandlerRegistry {
    commands: HashMap<CommandType, RegisteredCommand>,
    names: HashMap<&'static str, CommandType>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the handlers declared for `C`.
    ///
    /// Registering the same declarations twice is a no-op; registering
    /// different ones for an already known type fails.
    pub fn register<C: Command>(&mut self, spec: CommandSpec<C>) -> Result<(), RegistrationError> {
        let command = CommandType::of::<C>();
        let mut handlers = HashMap::with_capacity(spec.handlers.len());

        for declared in spec.handlers {
            declared
                .shape
                .validate_for(&declared.kind)
                .map_err(|reason| RegistrationError::MalformedShape {
                    command,
                    kind: declared.kind.clone(),
                    reason,
                })?;

            if handlers.contains_key(&declared.kind) {
                return Err(RegistrationError::DuplicateHandler {
                    command,
                    kind: declared.kind,
                });
            }

            let descriptor = HandlerDescriptor {
                command,
                kind: declared.kind.clone(),
                name: declared.name,
                shape: declared.shape,
                handler: declared.handler,
            };
            handlers.insert(declared.kind, Arc::new(descriptor));
        }

        if let Some(existing) = self.names.get(command.name()) {
            if *existing != command {
                return Err(RegistrationError::NameConflict {
                    name: command.name().to_string(),
                });
            }
        }

        let candidate = RegisteredCommand {
            command,
            handlers,
            admin_only: spec.admin_only,
            factory: spec.factory,
        };

        if let Some(existing) = self.commands.get(&command) {
            if existing.signature() != candidate.signature() {
                return Err(RegistrationError::ConflictingRegistration { command });
            }
            debug!(command = %command, "Command already registered, skipping");
            return Ok(());
        }

        info!(
            command = %command,
            handlers = candidate.handlers.len(),
            admin_only = candidate.admin_only,
            "Registered command"
        );
        self.names.insert(command.name(), command);
        self.commands.insert(command, candidate);
        Ok(())
    }

    /// Handler of `command` for `kind`, if one was declared
    pub fn resolve(&self, command: CommandType, kind: &EventKind) -> Option<&HandlerDescriptor> {
        self.commands
            .get(&command)
            .and_then(|registered| registered.handlers.get(kind))
            .map(|descriptor| descriptor.as_ref())
    }

    pub fn contains(&self, command: CommandType) -> bool {
        self.commands.contains_key(&command)
    }

    pub fn is_admin_only(&self, command: CommandType) -> bool {
        self.commands
            .get(&command)
            .map(|registered| registered.admin_only)
            .unwrap_or(false)
    }

    /// Create a fresh instance through the registered factory, handing it
    /// the menu entry's state
    pub fn instantiate(
        &self,
        command: CommandType,
        state: Option<&serde_json::Value>,
    ) -> Result<Box<dyn Command>, NavigationError> {
        let registered = self
            .commands
            .get(&command)
            .ok_or(NavigationError::UnregisteredCommand { command })?;
        let factory = registered
            .factory
            .as_ref()
            .ok_or(NavigationError::NoFactory { command })?;
        factory(state).map_err(|reason| NavigationError::InvalidState { command, reason })
    }

    /// Event kinds `command` has handlers for
    pub fn handled_kinds(&self, command: CommandType) -> Vec<EventKind> {
        self.commands
            .get(&command)
            .map(|registered| registered.handlers.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn command_types(&self) -> Vec<CommandType> {
        self.commands.values().map(|registered| registered.command).collect()
    }

    /// Look a command type up by its short name
    pub fn find_by_name(&self, name: &str) -> Option<CommandType> {
        self.names.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("commands", &self.names.keys().collect::<Vec<_>>())
            .finish()
    }
}
