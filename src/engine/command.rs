//! Command trait and command type identity
//!
//! A command is one "screen" of a conversation. Its handlers are not methods of
//! the trait: they are declared once per type in a [`CommandSpec`] and looked up
//! through the registry, so the trait only carries lifecycle hooks.
//!
//! [`CommandSpec`]: crate::engine::registry::CommandSpec

use std::any::{Any, TypeId};
use std::fmt;

/// Stable identity of a command type
#[derive(Debug, Clone, Copy)]
pub struct CommandType {
    name: &'static str,
    type_id: TypeId,
}

impl CommandType {
    /// Identity of the Rust type `C`
    pub fn of<C: 'static>() -> Self {
        Self {
            name: short_type_name(std::any::type_name::<C>()),
            type_id: TypeId::of::<C>(),
        }
    }

    /// Short type name, e.g. `RootCommand`
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }
}

impl PartialEq for CommandType {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for CommandType {}

impl std::hash::Hash for CommandType {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Strip module paths and generic arguments from a type name
fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Object-safe plumbing implemented for every eligible type
pub trait CommandBase: Any + Send + Sync {
    fn command_type(&self) -> CommandType;
    fn clone_box(&self) -> Box<dyn Command>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T> CommandBase for T
where
    T: Command + Clone,
{
    fn command_type(&self) -> CommandType {
        CommandType::of::<T>()
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A unit of conversational state placed on a context stack
pub trait Command: CommandBase + fmt::Debug {
    /// Called right before the instance is removed from the stack
    fn on_leave(&mut self) {}
}

impl Clone for Box<dyn Command> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

impl<'a> dyn Command + 'a {
    /// Downcast to a concrete command type
    pub fn downcast_ref<C: Command>(&self) -> Option<&C> {
        self.as_any().downcast_ref::<C>()
    }

    pub fn downcast_mut<C: Command>(&mut self) -> Option<&mut C> {
        self.as_any_mut().downcast_mut::<C>()
    }

    pub fn is<C: Command>(&self) -> bool {
        self.command_type() == CommandType::of::<C>()
    }
}

/// Fallback root used when the application does not configure one.
/// It has no handlers, so every event reports unhandled.
#[derive(Debug, Clone, Default)]
pub struct EmptyCommand;

impl Command for EmptyCommand {}
