//! Plain-text rendering of a transcript view.

use std::fmt::{self, Write as _};

use serde_json::Value;

use crate::config::DEFAULT_INDENT_WIDTH;
use crate::event::EventKind;
use crate::state::PreviewBody;
use crate::summary::{diff_line, output_messages, render_value};
use crate::traverse::RendererKind;
use crate::view::{Row, TranscriptView};

#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Columns per nesting level.
    pub indent_width: usize,
    /// Show the raw diff even when a preview exists.
    pub always_diff: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            indent_width: DEFAULT_INDENT_WIDTH,
            always_diff: false,
        }
    }
}

const SEPARATOR: &str = "----------------------------------------";

/// Render every row, indenting by depth and separating top-level steps.
pub fn render_text(view: &TranscriptView, options: &RenderOptions) -> String {
    let mut out = String::new();
    render_into(&mut out, view, options, 0).expect("writing to a String cannot fail");
    out
}

fn render_into(
    out: &mut String,
    view: &TranscriptView,
    options: &RenderOptions,
    base: usize,
) -> fmt::Result {
    for (event, row) in view.iter() {
        let pad = " ".repeat((base + row.directive.depth) * options.indent_width);
        let inner = " ".repeat((base + row.directive.depth + 1) * options.indent_width);
        writeln!(out, "{pad}{}", heading(row))?;

        if let Some(config) = &row.model_config {
            for (key, value) in config.iter().filter(|(_, v)| !v.is_null()) {
                writeln!(out, "{inner}{key}: {}", render_value(value))?;
            }
        }
        if let EventKind::Model { output, .. } = &event.kind {
            for message in output_messages(output) {
                writeln!(out, "{inner}{}", message_line(message))?;
            }
        }

        if let Some(mutation) = &row.mutation {
            if let Some(error) = &mutation.error {
                writeln!(out, "{inner}! {error}")?;
            }
            if let Some(preview) = &mutation.preview {
                writeln!(out, "{inner}[{}]", preview.signature)?;
                for line in preview_lines(&preview.body) {
                    writeln!(out, "{inner}{line}")?;
                }
            }
            if mutation.preview.is_none() || options.always_diff {
                for change in &mutation.changes {
                    let line = diff_line(change).to_string();
                    for (i, part) in line.lines().enumerate() {
                        let lead = if i == 0 { "" } else { "  " };
                        writeln!(out, "{inner}{lead}{part}")?;
                    }
                }
            }
        }

        if let Some(subtask) = &row.subtask {
            render_into(out, subtask, options, base + row.directive.depth + 1)?;
        }

        if row.directive.section_boundary && base == 0 {
            writeln!(out, "{SEPARATOR}")?;
        }
    }
    Ok(())
}

fn heading(row: &Row) -> String {
    match (row.directive.renderer, row.directive.elapsed) {
        (RendererKind::StepEnd, Some(elapsed)) => {
            let secs = elapsed.num_milliseconds() as f64 / 1000.0;
            format!("{} ({secs:.1}s)", row.title)
        }
        (RendererKind::StepEnd, None) => format!("{} (unmatched)", row.title),
        _ => row.title.clone(),
    }
}

fn message_line(message: &Value) -> String {
    let role = message
        .get("role")
        .and_then(Value::as_str)
        .unwrap_or("message");
    let content = message.get("content").map(render_value).unwrap_or_default();
    format!("{role}: {content}")
}

fn preview_lines(body: &PreviewBody) -> Vec<String> {
    match body {
        PreviewBody::Messages { messages } => messages
            .iter()
            .map(message_line)
            .collect(),
        PreviewBody::Tools { tools, tool_choice } => {
            let mut lines: Vec<String> = tools
                .iter()
                .map(|t| {
                    let name = t.get("name").and_then(|n| n.as_str()).unwrap_or("?");
                    match t.get("description").and_then(|d| d.as_str()) {
                        Some(desc) => format!("{name}: {desc}"),
                        None => name.to_string(),
                    }
                })
                .collect();
            lines.push(format!("tool_choice: {}", render_value(tool_choice)));
            lines
        }
        PreviewBody::Value { pointer, value } => {
            vec![format!("{pointer} = {}", render_value(value))]
        }
    }
}
