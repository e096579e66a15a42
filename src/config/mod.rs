//! Typed configuration from environment variables.
//!
//! Loads once at startup. Nothing is required; malformed values fail fast.

pub mod signatures;

use std::path::PathBuf;

use crate::error::{Error, Result};

pub const DEFAULT_INDENT_WIDTH: usize = 2;

#[derive(Debug, Clone)]
pub struct Config {
    /// Signature table file. `None` uses the built-in table.
    pub signatures_path: Option<PathBuf>,
    /// Columns per nesting level in text output.
    pub indent_width: usize,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            signatures_path: None,
            indent_width: DEFAULT_INDENT_WIDTH,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            signatures_path: std::env::var_os("TRANSCRIPT_SIGNATURES").map(PathBuf::from),
            indent_width: indent_var("TRANSCRIPT_INDENT")?,
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn indent_var(name: &str) -> Result<usize> {
    let Ok(raw) = std::env::var(name) else {
        return Ok(DEFAULT_INDENT_WIDTH);
    };
    match raw.trim().parse::<usize>() {
        Ok(width) if width <= 16 => Ok(width),
        _ => Err(Error::Config(format!(
            "{name} must be an integer between 0 and 16, got {raw:?}"
        ))),
    }
}
