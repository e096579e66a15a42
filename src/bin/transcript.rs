//! transcript CLI — render a recorded evaluation transcript as text.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use transcript_rs::config::Config;
use transcript_rs::config::signatures::load_table;
use transcript_rs::event::EvalEvents;
use transcript_rs::render::{RenderOptions, render_text};
use transcript_rs::state::SignatureTable;
use transcript_rs::telemetry::{TelemetryConfig, init_telemetry};
use transcript_rs::view::TranscriptView;

#[derive(Parser)]
#[command(name = "transcript", about = "Inspect recorded evaluation transcripts")]
struct Cli {
    /// Signature table TOML (overrides TRANSCRIPT_SIGNATURES)
    #[arg(long, global = true)]
    signatures: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the transcript as an indented tree
    Show {
        /// Transcript JSON file
        file: PathBuf,
        /// Show the raw diff even when a preview matched
        #[arg(long)]
        diff: bool,
        /// Columns per nesting level (overrides TRANSCRIPT_INDENT)
        #[arg(long)]
        indent: Option<usize>,
        /// Emit rows as JSON instead of text
        #[arg(long)]
        json: bool,
        /// Resolved state before the first mutation, as JSON (defaults to {})
        #[arg(long, value_name = "JSON")]
        initial_state: Option<String>,
    },
    /// Print the resolved state as of an event
    State {
        /// Transcript JSON file
        file: PathBuf,
        /// Event index (defaults to the last event)
        #[arg(long)]
        index: Option<usize>,
        /// Resolved state before the first mutation, as JSON (defaults to {})
        #[arg(long, value_name = "JSON")]
        initial_state: Option<String>,
    },
    /// List the active signature table in priority order
    Signatures,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env()?;

    init_telemetry(TelemetryConfig {
        log_level: config.log_level.clone(),
        compact: true,
    })?;

    let table = match &cli.signatures {
        Some(path) => load_table(path)?,
        None => config.signature_table()?,
    };

    match cli.command {
        Command::Show {
            file,
            diff,
            indent,
            json,
            initial_state,
        } => {
            let options = RenderOptions {
                indent_width: indent.unwrap_or(config.indent_width),
                always_diff: diff,
            };
            cmd_show(&file, &table, initial_state.as_deref(), &options, json)
        }
        Command::State {
            file,
            index,
            initial_state,
        } => cmd_state(&file, &table, initial_state.as_deref(), index),
        Command::Signatures => cmd_signatures(&table),
    }
}

fn load_view(
    file: &Path,
    table: &SignatureTable,
    initial_state: Option<&str>,
) -> anyhow::Result<TranscriptView> {
    let events = EvalEvents::from_path(file)
        .map_err(|e| anyhow::anyhow!("cannot load {}: {e}", file.display()))?;
    Ok(match initial_state {
        Some(json) => {
            let initial: serde_json::Value = serde_json::from_str(json)
                .map_err(|e| anyhow::anyhow!("invalid --initial-state: {e}"))?;
            TranscriptView::from_eval_events_seeded(&events, table, initial)
        }
        None => TranscriptView::from_eval_events(&events, table),
    })
}

fn cmd_show(
    file: &Path,
    table: &SignatureTable,
    initial_state: Option<&str>,
    options: &RenderOptions,
    json: bool,
) -> anyhow::Result<()> {
    let view = load_view(file, table, initial_state)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print!("{}", render_text(&view, options));
    }
    if view.unclosed_steps() > 0 {
        eprintln!("warning: {} step(s) never ended", view.unclosed_steps());
    }
    Ok(())
}

fn cmd_state(
    file: &Path,
    table: &SignatureTable,
    initial_state: Option<&str>,
    index: Option<usize>,
) -> anyhow::Result<()> {
    let view = load_view(file, table, initial_state)?;
    if view.is_empty() {
        anyhow::bail!("transcript has no events");
    }
    let index = index.unwrap_or(view.len() - 1);
    if index >= view.len() {
        anyhow::bail!("index {index} out of range, transcript has {} events", view.len());
    }
    match view.state_at(index) {
        Some(state) => println!("{}", serde_json::to_string_pretty(state)?),
        None => println!("No state changes at or before event {index}."),
    }
    Ok(())
}

fn cmd_signatures(table: &SignatureTable) -> anyhow::Result<()> {
    if table.is_empty() {
        println!("No signatures.");
        return Ok(());
    }
    println!("{:<4}  {:<20}  REQUIRES", "PRI", "NAME");
    println!("{}", "-".repeat(72));
    for (priority, signature) in table.iter().enumerate() {
        let requires: Vec<String> = signature
            .required()
            .map(|(op, path)| format!("{op}:{path}"))
            .collect();
        println!("{:<4}  {:<20}  {}", priority, signature.name, requires.join(", "));
    }
    println!("\n{} signature(s)", table.len());
    Ok(())
}
