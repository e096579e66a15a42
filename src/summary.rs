//! Human-readable labels for rows.

use serde_json::{Map, Value};

use crate::event::{Event, EventKind, StepAction};
use crate::model::Operation;

/// Title line for an event.
pub fn title(event: &Event) -> String {
    match &event.kind {
        EventKind::Info { .. } => "Info".to_string(),
        EventKind::Logger { message } => format!("Logger: {}", message.level),
        EventKind::Model { model, output, .. } => match total_tokens(output) {
            Some(tokens) => format!("Model Call: {model} ({tokens} tokens)"),
            None => format!("Model Call: {model}"),
        },
        EventKind::Score { .. } => "Score".to_string(),
        EventKind::State { .. } => "State Updated".to_string(),
        EventKind::Store { .. } => "Store Updated".to_string(),
        EventKind::Step {
            action: StepAction::Begin,
            name,
            ..
        } => format!("Step: {name}"),
        EventKind::Step {
            action: StepAction::End,
            name,
            ..
        } => format!("End Step: {name}"),
        EventKind::Subtask { name, .. } => format!("Subtask: {name}"),
        EventKind::Tool { function, .. } => format!("Tool: {function}"),
        EventKind::Unknown => "Unknown Event".to_string(),
    }
}

/// `output.usage.total_tokens` of a model call, when recorded and non-zero.
pub fn total_tokens(output: &Value) -> Option<u64> {
    output
        .pointer("/usage/total_tokens")
        .and_then(Value::as_u64)
        .filter(|&n| n > 0)
}

/// Messages produced by a model call. Some producers omit `choices`.
pub fn output_messages(output: &Value) -> Vec<&Value> {
    output
        .get("choices")
        .and_then(Value::as_array)
        .map(|choices| choices.iter().filter_map(|c| c.get("message")).collect())
        .unwrap_or_default()
}

/// Generate config shown for a model call: connection limits are an
/// execution detail and dropped; the tool choice directive is added.
pub fn model_config_entries(config: &Map<String, Value>, tool_choice: &Value) -> Map<String, Value> {
    let mut entries = config.clone();
    entries.remove("max_connections");
    entries.insert("tool_choice".to_string(), tool_choice.clone());
    entries
}

/// One row of a raw diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub symbol: Option<char>,
    pub path: String,
    pub value: String,
}

impl std::fmt::Display for DiffLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = self.symbol.unwrap_or(' ');
        if self.value.is_empty() {
            write!(f, "{symbol} {}", self.path)
        } else {
            write!(f, "{symbol} {} {}", self.path, self.value)
        }
    }
}

pub fn diff_line(change: &Operation) -> DiffLine {
    DiffLine {
        symbol: change.op.symbol(),
        path: change.path.clone(),
        value: change.value.as_ref().map(render_value).unwrap_or_default(),
    }
}

/// Objects and arrays as indented JSON, strings trimmed, null as nothing.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Object(_) | Value::Array(_) => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
        other => other.to_string(),
    }
}
