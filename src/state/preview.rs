//! Preview payloads and the builders that produce them.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::pointer::lookup;

/// A semantically labelled summary of a mutation batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preview {
    /// Name of the signature that produced this preview.
    pub signature: String,
    pub body: PreviewBody,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PreviewBody {
    /// Chat messages to show in place of the diff.
    Messages { messages: Vec<Value> },
    /// Tools made available and the tool choice directive.
    Tools { tools: Vec<Value>, tool_choice: Value },
    /// A single value from the resolved state.
    Value { pointer: String, value: Value },
}

/// Builds a preview body from the post-batch resolved state. Returning
/// `None` means the state lacks what the preview needs.
pub type PreviewBuilder = Arc<dyn Fn(&Value) -> Option<PreviewBody> + Send + Sync>;

/// Preview builders that can be named from a signature file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuiltinPreview {
    /// The first message of `/messages`.
    SystemMessage,
    /// `/tools` together with `/tool_choice`.
    UseTools,
    /// The value at an arbitrary pointer.
    Value { pointer: String },
}

impl BuiltinPreview {
    pub fn builder(&self) -> PreviewBuilder {
        match self {
            BuiltinPreview::SystemMessage => Arc::new(system_message),
            BuiltinPreview::UseTools => Arc::new(use_tools),
            BuiltinPreview::Value { pointer } => {
                let pointer = pointer.clone();
                Arc::new(move |resolved: &Value| value_at(resolved, &pointer))
            }
        }
    }
}

pub fn system_message(resolved: &Value) -> Option<PreviewBody> {
    let message = lookup(resolved, "/messages/0")?;
    Some(PreviewBody::Messages {
        messages: vec![message.clone()],
    })
}

pub fn use_tools(resolved: &Value) -> Option<PreviewBody> {
    let tools = lookup(resolved, "/tools")?.as_array()?.clone();
    let tool_choice = lookup(resolved, "/tool_choice")
        .cloned()
        .unwrap_or(Value::Null);
    Some(PreviewBody::Tools { tools, tool_choice })
}

pub fn value_at(resolved: &Value, pointer: &str) -> Option<PreviewBody> {
    let value = lookup(resolved, pointer)?;
    Some(PreviewBody::Value {
        pointer: pointer.to_string(),
        value: value.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn use_tools_needs_a_tool_list() {
        assert!(use_tools(&json!({"tool_choice": "auto"})).is_none());
        let body = use_tools(&json!({"tools": [{"name": "bash"}]})).unwrap();
        assert_eq!(
            body,
            PreviewBody::Tools {
                tools: vec![json!({"name": "bash"})],
                tool_choice: Value::Null,
            }
        );
    }

    #[test]
    fn builtin_names_parse_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            preview: BuiltinPreview,
        }
        let w: Wrapper = toml::from_str(r#"preview = "system_message""#).unwrap();
        assert_eq!(w.preview, BuiltinPreview::SystemMessage);
        let w: Wrapper = toml::from_str(r#"preview = { value = { pointer = "/output" } }"#).unwrap();
        assert_eq!(
            w.preview,
            BuiltinPreview::Value {
                pointer: "/output".to_string()
            }
        );
    }
}
