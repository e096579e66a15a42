//! Error types for transcript-rs.

use thiserror::Error;

use crate::model::OpKind;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot apply {op} at {path}: {reason}")]
    Patch {
        op: OpKind,
        path: String,
        reason: String,
    },

    #[error("invalid pointer {0:?}: must be empty or start with '/'")]
    Pointer(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub(crate) fn patch(op: OpKind, path: &str, reason: impl Into<String>) -> Self {
        Error::Patch {
            op,
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
