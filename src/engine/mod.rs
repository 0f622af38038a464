//! Conversation engine
//!
//! Registry, argument binding, per-conversation context stacks and the
//! dispatcher that ties them together.

pub mod binder;
pub mod command;
pub mod context;
pub mod data;
pub mod dispatcher;
pub mod effects;
pub mod event;
pub mod navigation;
pub mod observer;
pub mod outcome;
pub mod registry;
pub mod runtime;
pub mod stack;
pub mod system;

pub use binder::{Arg, BoundArgs, Param, ParamShape, Unbindable};
pub use command::{Command, CommandType, EmptyCommand};
pub use context::CommandContext;
pub use data::ConversationData;
pub use dispatcher::{Dispatcher, DispatcherBuilder, FallbackPolicy};
pub use effects::{Button, ContentType, OutboundEffect};
pub use event::{ConversationId, EventKind, InboundEvent, InboundSender, Payload};
pub use navigation::{NavigationDirective, NavigationResult, Reply};
pub use observer::{DispatchObserver, TracingObserver};
pub use outcome::{DispatchOutcome, DispatchReport, UnhandledReason};
pub use registry::{CommandSpec, HandlerDescriptor, HandlerRegistry};
pub use runtime::{BotRuntime, RuntimeOptions};
pub use stack::{ContextStack, EntrySnapshot, StackEntry};
pub use system::{SubCommand, SystemInput, GO_BACK, REFRESH};
