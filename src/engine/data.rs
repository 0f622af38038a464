//! Conversation data bag
//!
//! Key/value data shared by every command of one conversation. Values are kept
//! as JSON so commands can exchange typed data without knowing each other.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::event::ConversationId;
use crate::utils::errors::HandlerResult;

/// Data shared between the commands of a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationData {
    /// Conversation this data belongs to
    pub conversation_id: ConversationId,
    values: HashMap<String, serde_json::Value>,
    /// When the data was last changed
    pub updated_at: DateTime<Utc>,
}

impl ConversationData {
    pub fn new(conversation_id: ConversationId) -> Self {
        Self {
            conversation_id,
            values: HashMap::new(),
            updated_at: Utc::now(),
        }
    }

    /// Store a value under `key`, replacing any previous one
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> HandlerResult<()> {
        let json_value = serde_json::to_value(value)?;
        self.values.insert(key.to_string(), json_value);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Read a typed value
    pub fn get<T: for<'de> Deserialize<'de>>(&self, key: &str) -> HandlerResult<Option<T>> {
        match self.values.get(key) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    /// Raw JSON value
    pub fn get_value(&self, key: &str) -> Option<&serde_json::Value> {
        self.values.get(key)
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get::<String>(key).unwrap_or(None)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get::<i64>(key).unwrap_or(None)
    }

    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.updated_at = Utc::now();
        self.values.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> Vec<&String> {
        self.values.keys().collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.updated_at = Utc::now();
    }
}
