//! Core data model for state mutations.
//!
//! A mutation event carries a list of operations. Each operation is one
//! patch instruction against the resolved state, addressed by a
//! slash-delimited pointer.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Operation kind
// ---------------------------------------------------------------------------

/// The patch verb of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    Add,
    Remove,
    Replace,
    Copy,
    Move,
    Test,
}

impl OpKind {
    /// Symbol shown next to the path in a raw diff. Only the verbs that
    /// change a value get one.
    pub fn symbol(self) -> Option<char> {
        match self {
            OpKind::Add => Some('+'),
            OpKind::Remove => Some('-'),
            OpKind::Replace => Some('~'),
            OpKind::Copy | OpKind::Move | OpKind::Test => None,
        }
    }
}

impl std::fmt::Display for OpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OpKind::Add => "add",
            OpKind::Remove => "remove",
            OpKind::Replace => "replace",
            OpKind::Copy => "copy",
            OpKind::Move => "move",
            OpKind::Test => "test",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Operation
// ---------------------------------------------------------------------------

/// One patch instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub op: OpKind,

    /// Pointer into the resolved state.
    pub path: String,

    /// Payload for `add`, `replace` and `test`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    /// Source pointer for `copy` and `move`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    /// Prior value recorded by the producer for `replace`. Informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replaced: Option<Value>,
}

impl Operation {
    pub fn add(path: impl Into<String>, value: Value) -> Self {
        Self::with_value(OpKind::Add, path, value)
    }

    pub fn remove(path: impl Into<String>) -> Self {
        Self {
            op: OpKind::Remove,
            path: path.into(),
            value: None,
            from: None,
            replaced: None,
        }
    }

    pub fn replace(path: impl Into<String>, value: Value) -> Self {
        Self::with_value(OpKind::Replace, path, value)
    }

    pub fn test(path: impl Into<String>, value: Value) -> Self {
        Self::with_value(OpKind::Test, path, value)
    }

    pub fn copy(from: impl Into<String>, path: impl Into<String>) -> Self {
        Self::with_from(OpKind::Copy, from, path)
    }

    pub fn move_to(from: impl Into<String>, path: impl Into<String>) -> Self {
        Self::with_from(OpKind::Move, from, path)
    }

    fn with_value(op: OpKind, path: impl Into<String>, value: Value) -> Self {
        Self {
            op,
            path: path.into(),
            value: Some(value),
            from: None,
            replaced: None,
        }
    }

    fn with_from(op: OpKind, from: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            op,
            path: path.into(),
            value: None,
            from: Some(from.into()),
            replaced: None,
        }
    }
}
