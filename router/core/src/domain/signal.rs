// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Signal Aggregate
//!
//! A signal is the immutable, typed message exchanged between specters. It is
//! produced once, handed to a router, and logically copied to every matched
//! consumer. Nothing in the core mutates a signal after construction.
//!
//! Matching never looks at the struct directly: [`Signal::fields`] flattens it
//! into the field map that subscription patterns are evaluated against.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignalId(pub Uuid);

impl SignalId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SignalId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a subscribing specter
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConsumerId(String);

impl ConsumerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ConsumerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ConsumerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for ConsumerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Typed message routed between specters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub id: SignalId,

    /// Schema/topic identifier (e.g. "task.created")
    pub schema_id: String,

    pub payload: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,

    pub timestamp: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl Signal {
    pub fn new(schema_id: impl Into<String>, payload: Value) -> Self {
        Self {
            id: SignalId::new(),
            schema_id: schema_id.into(),
            payload,
            sender: None,
            recipient: None,
            timestamp: Utc::now(),
            topic: None,
            metadata: Map::new(),
        }
    }

    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    pub fn with_recipient(mut self, recipient: impl Into<String>) -> Self {
        self.recipient = Some(recipient.into());
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Flat field map used for pattern matching.
    ///
    /// Absent optional fields are omitted (so a pattern naming `recipient`
    /// never matches a broadcast signal). `payload` and `metadata` stay nested
    /// and are compared as opaque values.
    pub fn fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("id".to_string(), Value::String(self.id.to_string()));
        fields.insert("schema_id".to_string(), Value::String(self.schema_id.clone()));
        fields.insert("payload".to_string(), self.payload.clone());
        if let Some(sender) = &self.sender {
            fields.insert("sender".to_string(), Value::String(sender.clone()));
        }
        if let Some(recipient) = &self.recipient {
            fields.insert("recipient".to_string(), Value::String(recipient.clone()));
        }
        fields.insert(
            "timestamp".to_string(),
            Value::String(self.timestamp.to_rfc3339()),
        );
        if let Some(topic) = &self.topic {
            fields.insert("topic".to_string(), Value::String(topic.clone()));
        }
        if !self.metadata.is_empty() {
            fields.insert("metadata".to_string(), Value::Object(self.metadata.clone()));
        }
        fields
    }
}
