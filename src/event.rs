//! Transcript events.
//!
//! A transcript is an ordered log of events recorded while a sample ran.
//! The payloads are owned by the producer; this crate only looks inside them
//! where traversal, state resolution or a row title needs to.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::model::Operation;

/// One entry in the transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// When this event occurred.
    pub timestamp: DateTime<Utc>,
    /// What happened.
    #[serde(flatten)]
    pub kind: EventKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventKind {
    Info {
        #[serde(default)]
        data: Value,
    },
    Logger {
        message: LoggingMessage,
    },
    Model {
        model: String,
        #[serde(default)]
        input: Vec<Value>,
        #[serde(default)]
        tools: Vec<ToolInfo>,
        #[serde(default)]
        tool_choice: Value,
        #[serde(default)]
        config: Map<String, Value>,
        #[serde(default)]
        output: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        call: Option<Value>,
    },
    Score {
        score: Value,
    },
    State {
        changes: Vec<Operation>,
    },
    Store {
        changes: Vec<Operation>,
    },
    Step {
        action: StepAction,
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        step_type: Option<String>,
        name: String,
    },
    Subtask {
        name: String,
        #[serde(default)]
        input: Map<String, Value>,
        #[serde(default)]
        result: Value,
        #[serde(default)]
        events: EvalEvents,
    },
    Tool {
        function: String,
        #[serde(default)]
        arguments: Map<String, Value>,
        #[serde(default)]
        result: Value,
    },
    /// An event kind this crate has no renderer for.
    #[serde(other)]
    Unknown,
}

/// Whether a step event opens or closes its step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepAction {
    Begin,
    End,
}

/// A log record captured from the producer's logger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingMessage {
    pub level: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<f64>,
}

/// A tool made available to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

impl Event {
    pub fn new(timestamp: DateTime<Utc>, kind: EventKind) -> Self {
        Self { timestamp, kind }
    }

    /// Operations carried by a state or store event.
    pub fn changes(&self) -> Option<&[Operation]> {
        match &self.kind {
            EventKind::State { changes } | EventKind::Store { changes } => Some(changes),
            _ => None,
        }
    }
}

/// The events of one transcript plus the content they reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvalEvents {
    #[serde(default)]
    pub events: Vec<Event>,

    /// Long strings moved out of the events, keyed by content hash.
    #[serde(default)]
    pub content: HashMap<String, String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TranscriptDocument {
    Full(EvalEvents),
    Bare(Vec<Event>),
}

impl EvalEvents {
    pub fn new(events: Vec<Event>) -> Self {
        Self {
            events,
            content: HashMap::new(),
        }
    }

    /// Parse a transcript document: either `{"events": [...], "content": {...}}`
    /// or a bare array of events.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let doc: TranscriptDocument = serde_json::from_str(s)?;
        Ok(match doc {
            TranscriptDocument::Full(events) => events,
            TranscriptDocument::Bare(events) => Self::new(events),
        })
    }

    /// Read and parse a transcript file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }
}
