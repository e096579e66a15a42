//! Content references.
//!
//! Long strings in model calls and message state are stored once in
//! [`EvalEvents::content`] and referenced from the events as
//! `tc://<hash>`, with the map keyed by the bare hash. Resolution swaps
//! the references back for the text before the transcript is traversed.

use serde_json::Value;

use crate::event::{EvalEvents, Event, EventKind};
use crate::model::Operation;

/// Scheme prefix marking a content reference.
pub const CONTENT_PROTOCOL: &str = "tc://";

/// Object keys whose values may hold referenced content.
const CONTENT_KEYS: [&str; 5] = ["content", "message", "text", "image", "value"];

/// State paths whose change values may hold referenced content.
const CONTENT_PATHS: [&str; 2] = ["/messages", "/output"];

/// Return the events with every resolvable reference replaced. References
/// missing from the content map are left as they are.
pub fn resolve_content(events: &EvalEvents) -> Vec<Event> {
    let lookup = |text: &str| -> Option<String> {
        let hash = text.strip_prefix(CONTENT_PROTOCOL)?;
        events
            .content
            .get(hash)
            .or_else(|| events.content.get(text))
            .cloned()
    };
    events
        .events
        .iter()
        .map(|event| resolve_event(event, &lookup))
        .collect()
}

fn resolve_event(event: &Event, lookup: &dyn Fn(&str) -> Option<String>) -> Event {
    let mut event = event.clone();
    match &mut event.kind {
        EventKind::Model { input, output, .. } => {
            input.iter_mut().for_each(|message| resolve_message(message, lookup));
            if let Some(choices) = output.get_mut("choices").and_then(Value::as_array_mut) {
                for choice in choices {
                    if let Some(message) = choice.get_mut("message") {
                        resolve_message(message, lookup);
                    }
                }
            }
        }
        EventKind::State { changes } => {
            changes
                .iter_mut()
                .filter(|change| carries_content(change))
                .filter_map(|change| change.value.as_mut())
                .for_each(|value| resolve_value(value, lookup));
        }
        EventKind::Subtask { events, .. } => {
            events.events = resolve_content(events);
        }
        _ => {}
    }
    event
}

fn carries_content(change: &Operation) -> bool {
    CONTENT_PATHS.iter().any(|p| change.path.starts_with(p))
}

fn resolve_message(message: &mut Value, lookup: &dyn Fn(&str) -> Option<String>) {
    let Some(content) = message.get_mut("content") else {
        return;
    };
    match content {
        Value::String(text) => resolve_string(text, lookup),
        Value::Array(parts) => {
            for part in parts {
                for key in ["text", "image"] {
                    if let Some(Value::String(text)) = part.get_mut(key) {
                        resolve_string(text, lookup);
                    }
                }
            }
        }
        _ => {}
    }
}

fn resolve_value(value: &mut Value, lookup: &dyn Fn(&str) -> Option<String>) {
    match value {
        Value::String(text) => resolve_string(text, lookup),
        Value::Array(items) => items.iter_mut().for_each(|v| resolve_value(v, lookup)),
        Value::Object(map) => {
            for (key, v) in map.iter_mut() {
                if CONTENT_KEYS.contains(&key.as_str()) {
                    resolve_value(v, lookup);
                }
            }
        }
        _ => {}
    }
}

fn resolve_string(text: &mut String, lookup: &dyn Fn(&str) -> Option<String>) {
    if let Some(resolved) = lookup(text) {
        *text = resolved;
    }
}
