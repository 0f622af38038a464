//! Argument binder
//!
//! Projects an inbound event onto the parameter shape a handler declared.
//! Failing to bind is the normal way of saying "this handler does not apply".

use std::fmt;

use crate::engine::data::ConversationData;
use crate::engine::event::{EventKind, InboundEvent, Payload};

/// One declared handler parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Param {
    /// Text of a text event, arguments of a command, data of a callback
    Text,
    /// Name of a bot command
    CommandName,
    /// Data attached to an inline button
    CallbackData,
    /// Id of the message carrying the pressed button
    MessageId,
    /// The handler reads its context
    Context,
    /// Value stored in the conversation data bag
    Data(String),
    /// JSON payload of a custom event
    Json,
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Text => f.write_str("text"),
            Param::CommandName => f.write_str("command_name"),
            Param::CallbackData => f.write_str("callback_data"),
            Param::MessageId => f.write_str("message_id"),
            Param::Context => f.write_str("context"),
            Param::Data(key) => write!(f, "data[{}]", key),
            Param::Json => f.write_str("json"),
        }
    }
}

impl Param {
    /// Whether events of `kind` can ever carry this parameter
    fn supported_by(&self, kind: &EventKind) -> bool {
        match self {
            Param::Context | Param::Data(_) => true,
            Param::Text => matches!(kind, EventKind::Text | EventKind::Command | EventKind::Callback),
            Param::CommandName => matches!(kind, EventKind::Command),
            Param::CallbackData | Param::MessageId => matches!(kind, EventKind::Callback),
            Param::Json => matches!(kind, EventKind::Custom(_)),
        }
    }
}

/// Ordered list of parameters a handler expects
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ParamShape(Vec<Param>);

impl ParamShape {
    pub fn new(params: impl IntoIterator<Item = Param>) -> Self {
        Self(params.into_iter().collect())
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn params(&self) -> &[Param] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Registration-time check of the shape against the kind it handles.
    /// Returns the reason the shape is malformed.
    pub fn validate_for(&self, kind: &EventKind) -> std::result::Result<(), String> {
        for param in &self.0 {
            if !param.supported_by(kind) {
                return Err(format!("parameter '{}' can never be bound for {} events", param, kind));
            }
        }

        if self.0.iter().filter(|p| **p == Param::Context).count() > 1 {
            return Err("context parameter declared more than once".to_string());
        }

        for (idx, param) in self.0.iter().enumerate() {
            if let Param::Data(key) = param {
                if key.trim().is_empty() {
                    return Err("data parameter needs a non-empty key".to_string());
                }
                if self.0[..idx].contains(param) {
                    return Err(format!("parameter '{}' declared more than once", param));
                }
            }
        }

        Ok(())
    }
}

impl From<Vec<Param>> for ParamShape {
    fn from(params: Vec<Param>) -> Self {
        Self(params)
    }
}

impl From<&[Param]> for ParamShape {
    fn from(params: &[Param]) -> Self {
        Self(params.to_vec())
    }
}

impl<const N: usize> From<[Param; N]> for ParamShape {
    fn from(params: [Param; N]) -> Self {
        Self(params.to_vec())
    }
}

/// Concrete argument produced for one parameter
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Text(String),
    CommandName(String),
    CallbackData(String),
    MessageId(i32),
    Context,
    Data { key: String, value: Option<serde_json::Value> },
    Json(serde_json::Value),
}

/// Ordered argument list handed to a handler
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundArgs(Vec<Arg>);

impl BoundArgs {
    pub fn args(&self) -> &[Arg] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First text argument
    pub fn text(&self) -> Option<&str> {
        self.0.iter().find_map(|arg| match arg {
            Arg::Text(text) => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn command_name(&self) -> Option<&str> {
        self.0.iter().find_map(|arg| match arg {
            Arg::CommandName(name) => Some(name.as_str()),
            _ => None,
        })
    }

    pub fn callback_data(&self) -> Option<&str> {
        self.0.iter().find_map(|arg| match arg {
            Arg::CallbackData(data) => Some(data.as_str()),
            _ => None,
        })
    }

    pub fn message_id(&self) -> Option<i32> {
        self.0.iter().find_map(|arg| match arg {
            Arg::MessageId(id) => Some(*id),
            _ => None,
        })
    }

    /// Bound data value, `None` when the key was absent from the bag
    pub fn data(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.iter().find_map(|arg| match arg {
            Arg::Data { key: k, value } if k == key => value.as_ref(),
            _ => None,
        })
    }

    pub fn json(&self) -> Option<&serde_json::Value> {
        self.0.iter().find_map(|arg| match arg {
            Arg::Json(value) => Some(value),
            _ => None,
        })
    }
}

/// The event cannot satisfy the declared shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unbindable {
    pub param: Param,
    pub kind: EventKind,
}

impl fmt::Display for Unbindable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} event cannot provide parameter '{}'", self.kind, self.param)
    }
}

/// Build the argument list for `shape` from `event`
pub fn bind(
    shape: &ParamShape,
    event: &InboundEvent,
    data: &ConversationData,
) -> std::result::Result<BoundArgs, Unbindable> {
    let mut args = Vec::with_capacity(shape.len());

    for param in shape.params() {
        let arg = bind_param(param, &event.payload, data).ok_or_else(|| Unbindable {
            param: param.clone(),
            kind: event.kind.clone(),
        })?;
        args.push(arg);
    }

    Ok(BoundArgs(args))
}

fn bind_param(param: &Param, payload: &Payload, data: &ConversationData) -> Option<Arg> {
    match (param, payload) {
        (Param::Context, _) => Some(Arg::Context),
        (Param::Data(key), _) => Some(Arg::Data {
            key: key.clone(),
            value: data.get_value(key).cloned(),
        }),
        (Param::Text, Payload::Text(text)) => Some(Arg::Text(text.clone())),
        (Param::Text, Payload::Command { args, .. }) => Some(Arg::Text(args.clone())),
        (Param::Text, Payload::Callback { data, .. }) => Some(Arg::Text(data.clone())),
        (Param::CommandName, Payload::Command { name, .. }) => Some(Arg::CommandName(name.clone())),
        (Param::CallbackData, Payload::Callback { data, .. }) => Some(Arg::CallbackData(data.clone())),
        (Param::MessageId, Payload::Callback { message_id, .. }) => message_id.map(Arg::MessageId),
        (Param::Json, Payload::Json(value)) => Some(Arg::Json(value.clone())),
        _ => None,
    }
}
