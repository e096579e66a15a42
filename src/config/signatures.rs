//! Signature table files.
//!
//! A table is a TOML document of `[[signature]]` entries in priority order.
//! Each entry names the paths it requires per op and a built-in preview:
//!
//! ```toml
//! include_builtin = true
//!
//! [[signature]]
//! name = "answer"
//! replace = ["/output/completion"]
//! preview = { value = { pointer = "/output/completion" } }
//! ```

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use super::Config;
use crate::error::{Error, Result};
use crate::state::{BuiltinPreview, Signature, SignatureTable};

/// Top-level TOML wrapper.
#[derive(Debug, Deserialize)]
struct SignatureFile {
    /// Append the built-in signatures after the file's own entries.
    #[serde(default)]
    include_builtin: bool,
    #[serde(default)]
    signature: Vec<SignatureEntry>,
}

#[derive(Debug, Deserialize)]
struct SignatureEntry {
    name: String,
    #[serde(default)]
    add: Vec<String>,
    #[serde(default)]
    remove: Vec<String>,
    #[serde(default)]
    replace: Vec<String>,
    preview: BuiltinPreview,
}

impl From<SignatureEntry> for Signature {
    fn from(entry: SignatureEntry) -> Self {
        let mut signature = Signature::with_builtin(entry.name, &entry.preview);
        signature.add = entry.add;
        signature.remove = entry.remove;
        signature.replace = entry.replace;
        signature
    }
}

/// Parse a signature table from TOML text.
pub fn parse_table(content: &str) -> Result<SignatureTable> {
    let file: SignatureFile = toml::from_str(content)?;
    if let Some(entry) = file
        .signature
        .iter()
        .find(|e| e.add.is_empty() && e.remove.is_empty() && e.replace.is_empty())
    {
        return Err(Error::Config(format!(
            "signature {:?} requires no operations and would never match",
            entry.name
        )));
    }
    let mut table = SignatureTable::new(file.signature.into_iter().map(Signature::from).collect());
    if file.include_builtin {
        table.extend(SignatureTable::builtin().iter().cloned());
    }
    Ok(table)
}

/// Load a signature table from a TOML file.
pub fn load_table(path: &Path) -> Result<SignatureTable> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("cannot read signature table {}: {e}", path.display()))
    })?;
    let table = parse_table(&content).map_err(|e| {
        Error::Config(format!("bad signature table {}: {e}", path.display()))
    })?;
    info!(path = %path.display(), signatures = table.len(), "loaded signature table");
    Ok(table)
}

impl Config {
    /// The configured signature table, or the built-in one.
    pub fn signature_table(&self) -> Result<SignatureTable> {
        match &self.signatures_path {
            Some(path) => load_table(path),
            None => Ok(SignatureTable::builtin()),
        }
    }
}
