//! State resolution.
//!
//! A [`StateManager`] owns the resolved state of one transcript view and
//! folds every mutation event into it, strictly in event order.

pub mod patch;
pub mod pointer;
pub mod preview;
pub mod signature;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::Result;
use crate::model::Operation;

pub use preview::{BuiltinPreview, Preview, PreviewBody};
pub use signature::{Signature, SignatureTable};

/// Rolling resolved state for one transcript view.
///
/// Not idempotent: every call to [`StateManager::apply_changes`] applies its
/// operations again. Call it exactly once per mutation event.
#[derive(Debug, Clone)]
pub struct StateManager {
    resolved: Value,
    batches: usize,
}

impl Default for StateManager {
    fn default() -> Self {
        Self::with_initial(Value::Object(serde_json::Map::new()))
    }
}

impl StateManager {
    /// Seed with an empty object.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial(initial: Value) -> Self {
        Self {
            resolved: initial,
            batches: 0,
        }
    }

    /// Apply one event's operations and return the full updated state.
    ///
    /// The batch is atomic: if any operation fails the state keeps its
    /// pre-event value and the error is returned.
    pub fn apply_changes(&mut self, changes: &[Operation]) -> Result<&Value> {
        let mut working = self.resolved.clone();
        if let Err(e) = patch::apply_operations(&mut working, changes) {
            warn!(batch = self.batches, error = %e, "mutation batch rejected");
            return Err(e);
        }
        self.resolved = working;
        self.batches += 1;
        debug!(batch = self.batches, operations = changes.len(), "mutation batch applied");
        Ok(&self.resolved)
    }

    pub fn resolved(&self) -> &Value {
        &self.resolved
    }

    /// Number of batches applied successfully so far.
    pub fn batches(&self) -> usize {
        self.batches
    }
}
