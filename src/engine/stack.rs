//! Per-conversation context stack
//!
//! Ordered stack of live command instances: bottom is the root, top is the
//! current command. The stack never becomes empty and does no locking of its
//! own; the dispatcher guarantees one mutator at a time.

use std::panic::{self, AssertUnwindSafe};

use tracing::debug;
use uuid::Uuid;

use crate::engine::command::{Command, CommandType};
use crate::engine::system::SubCommand;
use crate::utils::errors::{panic_message, NavigationError};

/// Default maximum number of stacked commands
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// One live command instance
#[derive(Debug)]
pub struct StackEntry {
    instance_id: Uuid,
    command: Box<dyn Command>,
    menu: Vec<Vec<SubCommand>>,
}

impl StackEntry {
    fn new(command: Box<dyn Command>) -> Self {
        Self {
            instance_id: Uuid::new_v4(),
            command,
            menu: Vec::new(),
        }
    }

    /// Identity of this instance; stays the same while it is on the stack
    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    pub fn command(&self) -> &dyn Command {
        self.command.as_ref()
    }

    pub fn command_mut(&mut self) -> &mut dyn Command {
        self.command.as_mut()
    }

    pub fn command_type(&self) -> CommandType {
        self.command.command_type()
    }

    /// Menu most recently shown by this command
    pub fn menu(&self) -> &[Vec<SubCommand>] {
        &self.menu
    }

    pub fn snapshot(&self) -> EntrySnapshot {
        EntrySnapshot {
            instance_id: self.instance_id,
            command_type: self.command_type(),
            state: format!("{:?}", self.command),
            menu: self.menu.clone(),
        }
    }

    /// Run `on_leave` on a copy of the command. The entry is only removed
    /// once the hook returned, so a panicking hook leaves the stack intact.
    fn leave(&self) -> Result<CommandType, NavigationError> {
        let command_type = self.command_type();
        let mut leaving = self.command.clone_box();
        panic::catch_unwind(AssertUnwindSafe(|| leaving.on_leave())).map_err(|payload| {
            NavigationError::LeaveFailed {
                command: command_type,
                message: panic_message(payload.as_ref()),
            }
        })?;
        Ok(command_type)
    }
}

/// Structural view of one entry, comparable with `==`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySnapshot {
    pub instance_id: Uuid,
    pub command_type: CommandType,
    /// Debug rendering of the command's state
    pub state: String,
    pub menu: Vec<Vec<SubCommand>>,
}

/// Ordered stack of commands for one conversation
#[derive(Debug)]
pub struct ContextStack {
    entries: Vec<StackEntry>,
    max_depth: usize,
}

impl ContextStack {
    /// Create a stack holding only `root`
    pub fn new(root: Box<dyn Command>) -> Self {
        Self::with_max_depth(root, DEFAULT_MAX_DEPTH)
    }

    pub fn with_max_depth(root: Box<dyn Command>, max_depth: usize) -> Self {
        Self {
            entries: vec![StackEntry::new(root)],
            max_depth: max_depth.max(1),
        }
    }

    /// Current (top) entry
    pub fn current(&self) -> &StackEntry {
        self.entries.last().expect("context stack always holds a root")
    }

    pub fn current_mut(&mut self) -> &mut StackEntry {
        self.entries.last_mut().expect("context stack always holds a root")
    }

    /// Root (bottom) entry
    pub fn root(&self) -> &StackEntry {
        &self.entries[0]
    }

    pub fn root_mut(&mut self) -> &mut StackEntry {
        &mut self.entries[0]
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn is_at_root(&self) -> bool {
        self.entries.len() == 1
    }

    /// Command types from bottom to top
    pub fn command_types(&self) -> Vec<CommandType> {
        self.entries.iter().map(StackEntry::command_type).collect()
    }

    pub fn entries(&self) -> impl Iterator<Item = &StackEntry> {
        self.entries.iter()
    }

    /// Install `command` as the new current command
    pub fn push(&mut self, command: Box<dyn Command>) -> Result<Uuid, NavigationError> {
        if self.entries.len() >= self.max_depth {
            return Err(NavigationError::DepthExceeded { limit: self.max_depth });
        }

        let entry = StackEntry::new(command);
        let instance_id = entry.instance_id;
        debug!(command = %entry.command_type(), depth = self.entries.len() + 1, "Pushing command");
        self.entries.push(entry);
        Ok(instance_id)
    }

    /// Remove the current command; the root can never be popped
    pub fn pop(&mut self) -> Result<CommandType, NavigationError> {
        self.take_top().map(|entry| entry.command_type())
    }

    /// Pop the current command but hand the entry back, so the caller can
    /// [`restore_top`](Self::restore_top) it if a later step fails
    pub(crate) fn take_top(&mut self) -> Result<StackEntry, NavigationError> {
        if self.is_at_root() {
            return Err(NavigationError::CannotPopRoot);
        }

        let removed = self.current().leave()?;
        let entry = self.entries.pop().ok_or(NavigationError::CannotPopRoot)?;
        debug!(command = %removed, depth = self.entries.len(), "Popped command");
        Ok(entry)
    }

    pub(crate) fn restore_top(&mut self, entry: StackEntry) {
        debug!(command = %entry.command_type(), "Restoring popped command");
        self.entries.push(entry);
    }

    /// Swap the current command for `command` in one step.
    /// Replacing the root installs a new root.
    pub fn replace(&mut self, command: Box<dyn Command>) -> Result<CommandType, NavigationError> {
        let removed = self.current().leave()?;
        *self.current_mut() = StackEntry::new(command);
        debug!(removed = %removed, current = %self.current().command_type(), "Replaced command");
        Ok(removed)
    }

    /// Pop everything above the root, returning how many commands left.
    /// Leave hooks run top down; if one panics nothing is removed.
    pub fn reset(&mut self) -> Result<usize, NavigationError> {
        for entry in self.entries[1..].iter().rev() {
            entry.leave()?;
        }
        let removed = self.entries.len() - 1;
        self.entries.truncate(1);
        Ok(removed)
    }

    /// Drop the current command without running its leave hook. Used to
    /// undo a push whose command never became usable.
    pub(crate) fn discard_top(&mut self) -> Option<CommandType> {
        if self.is_at_root() {
            return None;
        }
        self.entries.pop().map(|entry| entry.command_type())
    }

    /// Structural view of the stack from bottom to top
    pub fn snapshot(&self) -> Vec<EntrySnapshot> {
        self.entries.iter().map(StackEntry::snapshot).collect()
    }

    /// Entry at `index`, counted from the root
    pub fn entry(&self, index: usize) -> Option<&StackEntry> {
        self.entries.get(index)
    }

    /// Overwrite the state of the entry at `index`, keeping its identity.
    /// Returns the previous state.
    pub(crate) fn commit_at(&mut self, index: usize, command: Box<dyn Command>) -> Option<Box<dyn Command>> {
        self.entries
            .get_mut(index)
            .map(|entry| std::mem::replace(&mut entry.command, command))
    }

    pub(crate) fn set_menu_at(&mut self, index: usize, menu: Vec<Vec<SubCommand>>) -> Option<Vec<Vec<SubCommand>>> {
        self.entries
            .get_mut(index)
            .map(|entry| std::mem::replace(&mut entry.menu, menu))
    }
}
