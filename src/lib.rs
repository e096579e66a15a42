//! # transcript-rs
//!
//! Core of an evaluation transcript viewer.
//!
//! Provides event-stream traversal (step nesting and depth), state
//! resolution (patch operations folded into a rolling snapshot), signature
//! matching (named previews for recognised mutation batches), and a view
//! that composes them in a single pass.

pub mod config;
pub mod content;
pub mod error;
pub mod event;
pub mod model;
pub mod render;
pub mod state;
pub mod summary;
pub mod telemetry;
pub mod traverse;
pub mod view;
