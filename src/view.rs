//! Transcript view: one pass over the events, both engines composed.
//!
//! Rows are computed once, from index 0, when the view is built. Reading
//! them again never re-applies a mutation batch. Each view owns its own
//! [`Traversal`] and [`StateManager`]; subtasks get views of their own.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{Span, info, warn};

use crate::content::resolve_content;
use crate::event::{EvalEvents, Event, EventKind};
use crate::model::Operation;
use crate::state::{Preview, SignatureTable, StateManager};
use crate::summary;
use crate::telemetry::{record_patch_failure, start_view_span};
use crate::traverse::{Directive, Traversal};

/// Outcome of folding one mutation event into the resolved state.
#[derive(Debug, Clone, Serialize)]
pub struct Mutation {
    /// The event's operations, for the raw diff.
    pub changes: Vec<Operation>,
    /// Resolved state after this event, or the last good state if it failed.
    pub resolved: Value,
    pub preview: Option<Preview>,
    /// Why the batch was rejected.
    pub error: Option<String>,
}

impl Mutation {
    /// Rows without a preview start collapsed.
    pub fn collapsed(&self) -> bool {
        self.preview.is_none()
    }
}

/// Everything a renderer needs for one event.
#[derive(Debug, Clone, Serialize)]
pub struct Row {
    pub index: usize,
    pub title: String,
    pub directive: Directive,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mutation: Option<Mutation>,
    /// Generate config of a model call, tool choice included.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_config: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtask: Option<TranscriptView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TranscriptView {
    #[serde(skip)]
    events: Vec<Event>,
    rows: Vec<Row>,
    unclosed_steps: usize,
}

impl TranscriptView {
    /// Resolve content references, then build from an empty state.
    pub fn from_eval_events(events: &EvalEvents, signatures: &SignatureTable) -> Self {
        Self::build(resolve_content(events), signatures)
    }

    /// Resolve content references, then build from `initial`.
    pub fn from_eval_events_seeded(
        events: &EvalEvents,
        signatures: &SignatureTable,
        initial: Value,
    ) -> Self {
        Self::build_seeded(resolve_content(events), signatures, initial)
    }

    /// Build every row in a single forward pass, starting from `{}`.
    pub fn build(events: Vec<Event>, signatures: &SignatureTable) -> Self {
        Self::build_with(events, signatures, StateManager::new())
    }

    /// Like [`TranscriptView::build`], with the resolved state seeded before
    /// the first mutation. Transcripts that edit pre-existing messages need
    /// the messages seeded here.
    pub fn build_seeded(events: Vec<Event>, signatures: &SignatureTable, initial: Value) -> Self {
        Self::build_with(events, signatures, StateManager::with_initial(initial))
    }

    fn build_with(events: Vec<Event>, signatures: &SignatureTable, mut state: StateManager) -> Self {
        let span = start_view_span(events.len());
        let _entered = span.enter();

        let mut traversal = Traversal::new();
        let rows: Vec<Row> = events
            .iter()
            .enumerate()
            .map(|(index, event)| {
                let directive = traversal.advance(event, index);
                let mutation = event
                    .changes()
                    .map(|changes| mutate(&mut state, signatures, changes, index));
                let (subtask, model_config) = match &event.kind {
                    EventKind::Subtask { events, .. } => {
                        (Some(Self::build(events.events.clone(), signatures)), None)
                    }
                    EventKind::Model {
                        config,
                        tool_choice,
                        ..
                    } => (None, Some(summary::model_config_entries(config, tool_choice))),
                    _ => (None, None),
                };
                Row {
                    index,
                    title: summary::title(event),
                    directive,
                    mutation,
                    model_config,
                    subtask,
                }
            })
            .collect();

        let unclosed_steps = traversal.open_steps().len();
        if unclosed_steps > 0 {
            warn!(unclosed_steps, "transcript ends with open steps");
        }
        info!(rows = rows.len(), "transcript view built");

        Self {
            events,
            rows,
            unclosed_steps,
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Events paired with their rows, in transcript order.
    pub fn iter(&self) -> impl Iterator<Item = (&Event, &Row)> {
        self.events.iter().zip(self.rows.iter())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Steps still open after the last event. Zero for a well-formed transcript.
    pub fn unclosed_steps(&self) -> usize {
        self.unclosed_steps
    }

    /// Resolved state as of row `index`: the state after the last mutation
    /// at or before it. `None` if no mutation has happened yet.
    pub fn state_at(&self, index: usize) -> Option<&Value> {
        let end = index.checked_add(1)?.min(self.rows.len());
        self.rows[..end]
            .iter()
            .rev()
            .find_map(|row| row.mutation.as_ref())
            .map(|mutation| &mutation.resolved)
    }
}

fn mutate(
    state: &mut StateManager,
    signatures: &SignatureTable,
    changes: &[Operation],
    index: usize,
) -> Mutation {
    match state.apply_changes(changes).cloned() {
        Ok(resolved) => Mutation {
            changes: changes.to_vec(),
            preview: signatures.match_changes(changes, &resolved),
            resolved,
            error: None,
        },
        Err(e) => {
            record_patch_failure(&Span::current(), index, &e.to_string());
            Mutation {
                changes: changes.to_vec(),
                resolved: state.resolved().clone(),
                preview: None,
                error: Some(e.to_string()),
            }
        }
    }
}
