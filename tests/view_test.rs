//! Integration tests for the composed transcript view and text rendering.

use serde_json::{Value, json};
use transcript_rs::error::Error;
use transcript_rs::event::EvalEvents;
use transcript_rs::render::{RenderOptions, render_text};
use transcript_rs::state::SignatureTable;
use transcript_rs::traverse::RendererKind;
use transcript_rs::view::TranscriptView;

fn ts(secs: u32) -> String {
    format!("2024-08-01T12:00:{secs:02}Z")
}

fn sample_transcript() -> Value {
    json!({
        "events": [
            {"event": "step", "action": "begin", "type": "solver", "name": "system_message", "timestamp": ts(0)},
            {"event": "state", "timestamp": ts(1), "changes": [
                {"op": "remove", "path": "/messages/0/source"},
                {"op": "replace", "path": "/messages/0/role", "value": "system"},
                {"op": "replace", "path": "/messages/0/content", "value": "tc://abc"},
                {"op": "add", "path": "/messages/1", "value": {"role": "user", "content": "Say Hello"}}
            ]},
            {"event": "step", "action": "end", "type": "solver", "name": "system_message", "timestamp": ts(2)},
            {"event": "step", "action": "begin", "type": "solver", "name": "generate", "timestamp": ts(3)},
            {"event": "model", "timestamp": ts(4), "model": "mockllm/model",
             "input": [{"role": "user", "content": "Say Hello"}],
             "tools": [], "tool_choice": "none", "config": {"max_connections": 10},
             "output": {"choices": [{"message": {"role": "assistant", "content": "tc://abc"}}],
                        "usage": {"total_tokens": 12}}},
            {"event": "state", "timestamp": ts(5), "changes": [
                {"op": "add", "path": "/messages/2", "value": {"role": "assistant", "content": "Hello"}}
            ]},
            {"event": "step", "action": "end", "type": "solver", "name": "generate", "timestamp": ts(8)},
            {"event": "score", "timestamp": ts(9), "score": {"value": "C"}}
        ],
        "content": {"abc": "You are a helpful assistant."}
    })
}

fn initial_messages() -> Value {
    json!({"messages": [{"role": "user", "content": "Say Hello", "source": "input"}]})
}

fn build(doc: Value) -> TranscriptView {
    let events = EvalEvents::from_json_str(&doc.to_string()).expect("parse transcript");
    TranscriptView::from_eval_events(&events, &SignatureTable::builtin())
}

fn build_seeded(doc: Value, initial: Value) -> TranscriptView {
    let events = EvalEvents::from_json_str(&doc.to_string()).expect("parse transcript");
    TranscriptView::from_eval_events_seeded(&events, &SignatureTable::builtin(), initial)
}

// ---------------------------------------------------------------------------
// Composition
// ---------------------------------------------------------------------------

#[test]
fn rows_carry_depth_titles_and_mutations() {
    let view = build_seeded(sample_transcript(), initial_messages());

    let depths: Vec<_> = view.rows().iter().map(|r| r.directive.depth).collect();
    assert_eq!(depths, [0, 1, 0, 0, 1, 1, 0, 0]);
    assert_eq!(view.unclosed_steps(), 0);

    let model_row = &view.rows()[4];
    assert_eq!(model_row.title, "Model Call: mockllm/model (12 tokens)");
    assert_eq!(
        model_row.model_config.clone().map(Value::Object),
        Some(json!({"tool_choice": "none"}))
    );

    let system = view.rows()[1].mutation.as_ref().unwrap();
    assert!(system.error.is_none());
    let preview = system.preview.as_ref().expect("system message preview");
    assert_eq!(preview.signature, "system_message");
    assert!(!system.collapsed());
    assert_eq!(
        system.resolved["messages"][0],
        json!({"role": "system", "content": "You are a helpful assistant."})
    );

    let append = view.rows()[5].mutation.as_ref().unwrap();
    assert!(append.preview.is_none());
    assert!(append.collapsed());
    assert_eq!(append.resolved["messages"].as_array().unwrap().len(), 3);

    let end = &view.rows()[6].directive;
    assert_eq!(end.renderer, RendererKind::StepEnd);
    assert_eq!(end.elapsed.map(|d| d.num_seconds()), Some(5));
    assert!(end.section_boundary);
}

#[test]
fn seed_is_not_shared_with_subtasks() {
    let view = build_seeded(
        json!([
            {"event": "subtask", "timestamp": ts(0), "name": "child", "input": {}, "result": null,
             "events": {"events": [
                {"event": "state", "timestamp": ts(0), "changes": [
                    {"op": "replace", "path": "/messages/0/role", "value": "system"}
                ]}
             ], "content": {}}}
        ]),
        initial_messages(),
    );
    let nested = view.rows()[0].subtask.as_ref().expect("nested view");
    let mutation = nested.rows()[0].mutation.as_ref().unwrap();
    assert!(mutation.error.is_some());
    assert_eq!(mutation.resolved, json!({}));
}

#[test]
fn missing_transcript_file_is_an_io_error() {
    let result = EvalEvents::from_path(std::path::Path::new("/nonexistent/transcript.json"));
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn transcript_files_load_from_disk() {
    let path = std::env::temp_dir().join(format!("transcript-view-{}.json", std::process::id()));
    std::fs::write(&path, sample_transcript().to_string()).unwrap();
    let events = EvalEvents::from_path(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(events.events.len(), 8);
    assert_eq!(events.content.len(), 1);
}

#[test]
fn content_references_are_resolved_in_model_events() {
    let view = build(sample_transcript());
    let (event, _) = view.iter().nth(4).unwrap();
    let json = serde_json::to_value(event).unwrap();
    assert_eq!(
        json["output"]["choices"][0]["message"]["content"],
        "You are a helpful assistant."
    );
}

#[test]
fn failed_patch_keeps_last_good_state_and_rendering_continues() {
    let view = build(json!([
        {"event": "state", "timestamp": ts(0), "changes": [{"op": "add", "path": "/a", "value": 1}]},
        {"event": "state", "timestamp": ts(1), "changes": [
            {"op": "add", "path": "/c", "value": 3},
            {"op": "remove", "path": "/missing"}
        ]},
        {"event": "info", "timestamp": ts(2), "data": "still here"},
        {"event": "state", "timestamp": ts(3), "changes": [{"op": "add", "path": "/b", "value": 2}]}
    ]));

    let failed = view.rows()[1].mutation.as_ref().unwrap();
    assert!(failed.error.as_deref().unwrap().contains("/missing"));
    assert!(failed.preview.is_none());
    assert_eq!(failed.resolved, json!({"a": 1}));

    assert_eq!(view.rows()[2].title, "Info");
    let later = view.rows()[3].mutation.as_ref().unwrap();
    assert!(later.error.is_none());
    assert_eq!(later.resolved, json!({"a": 1, "b": 2}));
}

#[test]
fn unseeded_message_edits_fail_without_aborting_the_view() {
    let view = build(sample_transcript());
    let failed = view.rows()[1].mutation.as_ref().unwrap();
    assert!(failed.error.is_some());
    assert_eq!(failed.resolved, json!({}));
    assert_eq!(view.len(), 8);
    assert_eq!(view.rows()[7].title, "Score");
}

#[test]
fn state_at_returns_the_snapshot_in_effect() {
    let view = build(json!([
        {"event": "info", "timestamp": ts(0), "data": null},
        {"event": "store", "timestamp": ts(1), "changes": [{"op": "add", "path": "/k", "value": 1}]},
        {"event": "info", "timestamp": ts(2), "data": null},
        {"event": "store", "timestamp": ts(3), "changes": [{"op": "replace", "path": "/k", "value": 2}]}
    ]));
    assert_eq!(view.state_at(0), None);
    assert_eq!(view.state_at(1), Some(&json!({"k": 1})));
    assert_eq!(view.state_at(2), Some(&json!({"k": 1})));
    assert_eq!(view.state_at(3), Some(&json!({"k": 2})));
    assert_eq!(view.state_at(99), Some(&json!({"k": 2})));
    assert_eq!(view.rows()[1].title, "Store Updated");
}

#[test]
fn reading_rows_again_does_not_reapply_changes() {
    let view = build(json!([
        {"event": "state", "timestamp": ts(0), "changes": [{"op": "add", "path": "/xs", "value": []}]},
        {"event": "state", "timestamp": ts(1), "changes": [{"op": "add", "path": "/xs/-", "value": 1}]}
    ]));
    let first: Vec<_> = view.rows().iter().map(|r| r.mutation.clone().unwrap().resolved).collect();
    let second: Vec<_> = view.rows().iter().map(|r| r.mutation.clone().unwrap().resolved).collect();
    assert_eq!(first, second);
    assert_eq!(view.state_at(1), Some(&json!({"xs": [1]})));
}

#[test]
fn subtasks_get_their_own_engines() {
    let view = build(json!([
        {"event": "step", "action": "begin", "name": "outer", "timestamp": ts(0)},
        {"event": "store", "timestamp": ts(1), "changes": [{"op": "add", "path": "/a", "value": 1}]},
        {"event": "subtask", "timestamp": ts(2), "name": "lookup", "input": {}, "result": null,
         "events": {"events": [
            {"event": "step", "action": "begin", "name": "inner", "timestamp": ts(2)},
            {"event": "store", "timestamp": ts(3), "changes": [{"op": "add", "path": "/b", "value": 2}]},
            {"event": "step", "action": "end", "name": "inner", "timestamp": ts(4)}
         ], "content": {}}},
        {"event": "step", "action": "end", "name": "outer", "timestamp": ts(5)}
    ]));

    let row = &view.rows()[2];
    assert_eq!(row.title, "Subtask: lookup");
    assert_eq!(row.directive.depth, 1);
    let nested = row.subtask.as_ref().expect("nested view");
    let depths: Vec<_> = nested.rows().iter().map(|r| r.directive.depth).collect();
    assert_eq!(depths, [0, 1, 0]);
    assert_eq!(nested.state_at(1), Some(&json!({"b": 2})));
    assert_eq!(view.state_at(3), Some(&json!({"a": 1})));
}

// ---------------------------------------------------------------------------
// Text rendering
// ---------------------------------------------------------------------------

#[test]
fn text_rendering_indents_and_separates_sections() {
    let view = build(json!([
        {"event": "step", "action": "begin", "name": "init", "timestamp": ts(0)},
        {"event": "info", "timestamp": ts(1), "data": "1"},
        {"event": "store", "timestamp": ts(2), "changes": [{"op": "add", "path": "/k", "value": "v"}]},
        {"event": "step", "action": "end", "name": "init", "timestamp": ts(3)},
        {"event": "tool", "timestamp": ts(4), "function": "bash", "arguments": {"cmd": "ls"}, "result": "ok"},
        {"event": "step", "action": "end", "name": "stray", "timestamp": ts(5)}
    ]));
    let text = render_text(
        &view,
        &RenderOptions {
            indent_width: 2,
            always_diff: false,
        },
    );
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(
        lines,
        [
            "Step: init",
            "  Info",
            "  Store Updated",
            "    + /k v",
            "End Step: init (3.0s)",
            "----------------------------------------",
            "Tool: bash",
            "End Step: stray (unmatched)",
        ]
    );
}

#[test]
fn text_rendering_shows_completions_and_previews() {
    let view = build(json!([
        {"event": "state", "timestamp": ts(0), "changes": [
            {"op": "add", "path": "/tools", "value": []},
            {"op": "add", "path": "/tool_choice", "value": "none"}
        ]},
        {"event": "state", "timestamp": ts(1), "changes": [
            {"op": "add", "path": "/tools/0", "value": {"name": "bash", "description": "Run a command"}},
            {"op": "replace", "path": "/tool_choice", "value": "auto"}
        ]},
        {"event": "model", "timestamp": ts(2), "model": "mockllm/model",
         "output": {"choices": [{"message": {"role": "assistant", "content": "Hello "}}]}}
    ]));
    let text = render_text(&view, &RenderOptions::default());
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(
        lines,
        [
            "State Updated",
            "  + /tools []",
            "  + /tool_choice none",
            "State Updated",
            "  [use_tools]",
            "  bash: Run a command",
            "  tool_choice: auto",
            "Model Call: mockllm/model",
            "  assistant: Hello",
        ]
    );
}

#[test]
fn text_rendering_lists_model_config() {
    let view = build(json!([
        {"event": "model", "timestamp": ts(0), "model": "mockllm/model",
         "tool_choice": "auto", "config": {"max_connections": 10, "temperature": 0.5},
         "output": {"choices": [{"message": {"role": "assistant", "content": "Hi"}}]}}
    ]));
    let text = render_text(&view, &RenderOptions::default());
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(
        lines,
        [
            "Model Call: mockllm/model",
            "  temperature: 0.5",
            "  tool_choice: auto",
            "  assistant: Hi",
        ]
    );
}
