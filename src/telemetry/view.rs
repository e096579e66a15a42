//! Transcript view span helpers.

use tracing::Span;

/// Start a span covering one transcript view build.
pub fn start_view_span(events: usize) -> Span {
    tracing::info_span!("transcript.view", "transcript.events" = events)
}

/// Record a rejected mutation batch on the given span.
pub fn record_patch_failure(span: &Span, index: usize, error: &str) {
    span.in_scope(|| {
        tracing::warn!(index, error, "patch_failure");
    });
}
