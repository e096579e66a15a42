//! Integration tests for telemetry initialization and span helpers.

use transcript_rs::error::Error;
use transcript_rs::telemetry::{TelemetryConfig, init_telemetry, record_patch_failure, start_view_span};

#[test]
fn telemetry_initializes_with_defaults() {
    // A global subscriber can only be set once per process; a second init
    // returning Err is acceptable.
    let _ = init_telemetry(TelemetryConfig::default());
}

#[test]
fn bad_log_level_is_a_config_error() {
    unsafe {
        std::env::remove_var("RUST_LOG");
    }
    let result = init_telemetry(TelemetryConfig {
        log_level: "transcript_rs=verbose".to_string(),
        compact: true,
    });
    assert!(matches!(result, Err(Error::Config(_))), "got {result:?}");
}

#[test]
fn view_span_creates_and_records_failures() {
    let span = start_view_span(3);
    record_patch_failure(&span, 1, "cannot apply remove at /x: path does not exist");
}
