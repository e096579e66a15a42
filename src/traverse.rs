//! Event-stream traversal.
//!
//! Turns the flat event list into render directives: which renderer draws
//! each event and at what nesting depth. Step events open and close nesting
//! levels; the open steps live on an explicit stack owned by [`Traversal`].

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::event::{Event, EventKind, StepAction};

/// The renderer variant that draws an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RendererKind {
    Info,
    Logger,
    Model,
    Score,
    /// Used for both `state` and `store` events.
    State,
    StepBegin,
    StepEnd,
    Subtask,
    Tool,
    /// Generic stand-in for event kinds without a renderer.
    Placeholder,
}

impl RendererKind {
    /// Map an event to its renderer. The match is exhaustive so a new event
    /// kind does not compile until it has a mapping.
    pub fn for_event(kind: &EventKind) -> Self {
        match kind {
            EventKind::Info { .. } => RendererKind::Info,
            EventKind::Logger { .. } => RendererKind::Logger,
            EventKind::Model { .. } => RendererKind::Model,
            EventKind::Score { .. } => RendererKind::Score,
            EventKind::State { .. } | EventKind::Store { .. } => RendererKind::State,
            EventKind::Step {
                action: StepAction::Begin,
                ..
            } => RendererKind::StepBegin,
            EventKind::Step {
                action: StepAction::End,
                ..
            } => RendererKind::StepEnd,
            EventKind::Subtask { .. } => RendererKind::Subtask,
            EventKind::Tool { .. } => RendererKind::Tool,
            EventKind::Unknown => RendererKind::Placeholder,
        }
    }
}

/// An open step on the nesting stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFrame {
    pub name: String,
    pub started: DateTime<Utc>,
}

/// How one event should be drawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Directive {
    pub renderer: RendererKind,
    pub depth: usize,
    /// Begin timestamp of the step a step-end closes. `None` for every other
    /// event and for a step-end with no open step.
    pub step_started: Option<DateTime<Utc>>,
    /// Time between the matching step-begin and this step-end.
    #[serde(skip)]
    pub elapsed: Option<TimeDelta>,
    /// Set on a step-end that closes the last open step. The caller draws a
    /// separator between top-level phases here.
    pub section_boundary: bool,
}

impl Directive {
    fn at(renderer: RendererKind, depth: usize) -> Self {
        Self {
            renderer,
            depth,
            step_started: None,
            elapsed: None,
            section_boundary: false,
        }
    }
}

/// Nesting state for one pass over one transcript.
///
/// Call [`Traversal::advance`] once per event in array order. The stack
/// persists between calls; [`Traversal::reset`] starts a fresh pass.
#[derive(Debug, Default)]
pub struct Traversal {
    stack: Vec<StepFrame>,
}

impl Traversal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Produce the directive for `event` and update the step stack.
    pub fn advance(&mut self, event: &Event, index: usize) -> Directive {
        let renderer = RendererKind::for_event(&event.kind);
        match &event.kind {
            EventKind::Step {
                action: StepAction::Begin,
                name,
                ..
            } => {
                self.stack.push(StepFrame {
                    name: name.clone(),
                    started: event.timestamp,
                });
                let depth = self.stack.len() - 1;
                debug!(index, step = %name, depth, "step begin");
                Directive::at(renderer, depth)
            }
            EventKind::Step {
                action: StepAction::End,
                name,
                ..
            } => {
                let Some(frame) = self.stack.pop() else {
                    warn!(index, step = %name, "step end without an open step");
                    return Directive::at(renderer, 0);
                };
                if frame.name != *name {
                    warn!(index, open = %frame.name, closing = %name, "step end name mismatch");
                }
                let depth = self.stack.len();
                let elapsed = event.timestamp - frame.started;
                debug!(index, step = %name, depth, elapsed_ms = elapsed.num_milliseconds(), "step end");
                Directive {
                    renderer,
                    depth,
                    step_started: Some(frame.started),
                    elapsed: Some(elapsed),
                    section_boundary: depth == 0,
                }
            }
            EventKind::Unknown => {
                warn!(index, "no renderer for event kind, using placeholder");
                Directive::at(renderer, self.depth())
            }
            _ => Directive::at(renderer, self.depth()),
        }
    }

    /// Depth at which the next non-step event would be drawn.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Steps opened but not yet closed, outermost first.
    pub fn open_steps(&self) -> &[StepFrame] {
        &self.stack
    }

    pub fn is_balanced(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn reset(&mut self) {
        self.stack.clear();
    }
}

/// Run a fresh traversal over a whole event list.
pub fn directives(events: &[Event]) -> Vec<Directive> {
    let mut traversal = Traversal::new();
    events
        .iter()
        .enumerate()
        .map(|(index, event)| traversal.advance(event, index))
        .collect()
}
