//! Signature matching.
//!
//! A signature names a shape of mutation batch by the `(op, path)` pairs it
//! must contain. The table is plain data tried in priority order; one
//! generic matcher evaluates every entry.

use serde_json::Value;
use tracing::debug;

use super::preview::{BuiltinPreview, Preview, PreviewBuilder};
use crate::model::{OpKind, Operation};

/// A named rule plus the preview it produces.
#[derive(Clone)]
pub struct Signature {
    pub name: String,
    pub add: Vec<String>,
    pub remove: Vec<String>,
    pub replace: Vec<String>,
    builder: PreviewBuilder,
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signature")
            .field("name", &self.name)
            .field("add", &self.add)
            .field("remove", &self.remove)
            .field("replace", &self.replace)
            .finish_non_exhaustive()
    }
}

impl Signature {
    pub fn new(name: impl Into<String>, builder: PreviewBuilder) -> Self {
        Self {
            name: name.into(),
            add: Vec::new(),
            remove: Vec::new(),
            replace: Vec::new(),
            builder,
        }
    }

    pub fn with_builtin(name: impl Into<String>, preview: &BuiltinPreview) -> Self {
        Self::new(name, preview.builder())
    }

    pub fn adds(mut self, path: impl Into<String>) -> Self {
        self.add.push(path.into());
        self
    }

    pub fn removes(mut self, path: impl Into<String>) -> Self {
        self.remove.push(path.into());
        self
    }

    pub fn replaces(mut self, path: impl Into<String>) -> Self {
        self.replace.push(path.into());
        self
    }

    /// Every `(op, path)` pair this signature requires.
    pub fn required(&self) -> impl Iterator<Item = (OpKind, &str)> {
        self.add
            .iter()
            .map(|path| (OpKind::Add, path.as_str()))
            .chain(self.remove.iter().map(|path| (OpKind::Remove, path.as_str())))
            .chain(self.replace.iter().map(|path| (OpKind::Replace, path.as_str())))
    }

    pub fn required_count(&self) -> usize {
        self.add.len() + self.remove.len() + self.replace.len()
    }

    /// True when every required pair appears somewhere in `changes`. Extra
    /// operations do not disqualify. A signature with no pairs never matches.
    pub fn is_satisfied_by(&self, changes: &[Operation]) -> bool {
        let total = self.required_count();
        if total == 0 {
            return false;
        }
        let present = self
            .required()
            .filter(|(op, path)| changes.iter().any(|c| c.op == *op && c.path == *path))
            .count();
        present == total
    }

    pub fn build_preview(&self, resolved: &Value) -> Option<Preview> {
        (self.builder)(resolved).map(|body| Preview {
            signature: self.name.clone(),
            body,
        })
    }
}

/// Ordered signatures, highest priority first.
#[derive(Debug, Clone, Default)]
pub struct SignatureTable {
    signatures: Vec<Signature>,
}

impl SignatureTable {
    pub fn new(signatures: Vec<Signature>) -> Self {
        Self { signatures }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// The shapes the transcript producer is known to emit.
    pub fn builtin() -> Self {
        Self::new(vec![
            Signature::with_builtin("system_message", &BuiltinPreview::SystemMessage)
                .removes("/messages/0/source")
                .replaces("/messages/0/role")
                .replaces("/messages/0/content")
                .adds("/messages/1"),
            Signature::with_builtin("use_tools", &BuiltinPreview::UseTools)
                .adds("/tools/0")
                .replaces("/tool_choice"),
        ])
    }

    /// Append at the lowest priority.
    pub fn push(&mut self, signature: Signature) {
        self.signatures.push(signature);
    }

    /// Insert at `index`, clamped to the table length.
    pub fn insert(&mut self, index: usize, signature: Signature) {
        let index = index.min(self.signatures.len());
        self.signatures.insert(index, signature);
    }

    /// Remove the first signature called `name`.
    pub fn remove(&mut self, name: &str) -> Option<Signature> {
        let position = self.signatures.iter().position(|s| s.name == name)?;
        Some(self.signatures.remove(position))
    }

    pub fn get(&self, name: &str) -> Option<&Signature> {
        self.signatures.iter().find(|s| s.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Signature> {
        self.signatures.iter()
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    /// First signature, in priority order, satisfied by `changes`.
    pub fn classify(&self, changes: &[Operation]) -> Option<&Signature> {
        self.signatures.iter().find(|s| s.is_satisfied_by(changes))
    }

    /// Classify `changes` and build the winning signature's preview from the
    /// post-batch state. `None` is the common case and means "show the diff".
    pub fn match_changes(&self, changes: &[Operation], resolved: &Value) -> Option<Preview> {
        let signature = self.classify(changes)?;
        let preview = signature.build_preview(resolved);
        debug!(
            signature = %signature.name,
            built = preview.is_some(),
            "mutation batch matched signature"
        );
        preview
    }
}

impl Extend<Signature> for SignatureTable {
    fn extend<T: IntoIterator<Item = Signature>>(&mut self, iter: T) {
        self.signatures.extend(iter);
    }
}
