//! System inputs and menu sub-commands
//!
//! `_BACK` and `_REFRESH` are reserved inputs handled by the dispatcher itself.
//! Sub-commands are menu buttons; a button that targets a command type pushes a
//! fresh instance of it when pressed.

use serde::{Deserialize, Serialize};

use crate::engine::command::{Command, CommandType};
use crate::engine::effects::Button;
use crate::engine::event::{EventKind, InboundEvent};

/// Pops the current command and refreshes the previous one
pub const GO_BACK: &str = "_BACK";

/// Refreshes the current command
pub const REFRESH: &str = "_REFRESH";

const COMMAND_SUFFIX: &str = "_COMMAND";

/// Input reserved by the framework
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemInput {
    Back,
    Refresh,
}

impl SystemInput {
    /// Recognise a system input in a text or callback event
    pub fn parse(event: &InboundEvent) -> Option<Self> {
        if !matches!(event.kind, EventKind::Text | EventKind::Callback) {
            return None;
        }

        match event.payload.text()?.trim() {
            GO_BACK => Some(SystemInput::Back),
            REFRESH => Some(SystemInput::Refresh),
            _ => None,
        }
    }
}

/// Menu entry shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubCommand {
    /// Identifier sent back by the button
    pub title_id: String,
    /// Visible title, `title_id` when absent
    pub title: Option<String>,
    /// Command pushed when the entry is chosen
    #[serde(skip)]
    pub target: Option<CommandType>,
    /// Initial state handed to the target's factory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<serde_json::Value>,
}

impl SubCommand {
    /// Entry that enters command `C`
    pub fn of<C: Command>() -> Self {
        Self {
            title_id: title_id_of(CommandType::of::<C>()),
            title: None,
            target: Some(CommandType::of::<C>()),
            state: None,
        }
    }

    /// Entry without a target; its id reaches the current command's handler
    pub fn action(title_id: impl Into<String>) -> Self {
        Self {
            title_id: title_id.into(),
            title: None,
            target: None,
            state: None,
        }
    }

    pub fn back() -> Self {
        Self::action(GO_BACK)
    }

    pub fn refresh() -> Self {
        Self::action(REFRESH)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_title_id(mut self, title_id: impl Into<String>) -> Self {
        self.title_id = title_id.into();
        self
    }

    /// Attach initial state for the entered command, e.g. the selected item
    pub fn with_state(mut self, state: serde_json::Value) -> Self {
        self.state = Some(state);
        self
    }

    pub fn is_system(&self) -> bool {
        self.system_input().is_some()
    }

    /// System input this entry stands for, whatever its visible title
    pub fn system_input(&self) -> Option<SystemInput> {
        match self.title_id.as_str() {
            GO_BACK => Some(SystemInput::Back),
            REFRESH => Some(SystemInput::Refresh),
            _ => None,
        }
    }

    pub fn to_button(&self) -> Button {
        Button {
            title: self.title.clone().unwrap_or_else(|| self.title_id.clone()),
            data: self.title_id.clone(),
        }
    }
}

fn camel_case_pattern() -> &'static regex::Regex {
    static PATTERN: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
    PATTERN.get_or_init(|| regex::Regex::new(r"([a-z\d])([A-Z]+)").expect("static camel case pattern is valid"))
}

/// Default title id of a command type: `FooBarCommand` becomes `FOO_BAR`
pub fn title_id_of(command: CommandType) -> String {
    let snake = camel_case_pattern()
        .replace_all(command.name(), "${1}_${2}")
        .to_uppercase();

    match snake.strip_suffix(COMMAND_SUFFIX) {
        Some(stripped) if !stripped.is_empty() => stripped.to_string(),
        _ => snake,
    }
}

/// Convert menu rows into keyboard rows, dropping empty rows
pub fn to_keyboard(rows: &[Vec<SubCommand>]) -> Vec<Vec<Button>> {
    rows.iter()
        .filter(|row| !row.is_empty())
        .map(|row| row.iter().map(SubCommand::to_button).collect())
        .collect()
}

/// Find the menu entry selected by an event
pub fn find_selected<'a>(menu: &'a [Vec<SubCommand>], event: &InboundEvent) -> Option<&'a SubCommand> {
    if !matches!(event.kind, EventKind::Text | EventKind::Callback) {
        return None;
    }

    let selected = event.payload.text()?.trim();
    menu.iter().flatten().find(|entry| match event.kind {
        EventKind::Callback => entry.title_id == selected,
        _ => entry.title_id == selected || entry.title.as_deref() == Some(selected),
    })
}
