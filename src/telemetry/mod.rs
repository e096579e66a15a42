//! Logging initialization.
//!
//! Sets up a tracing-subscriber registry with an env filter and a fmt layer
//! writing to stderr, so rendered output on stdout stays clean.

pub mod view;

pub use view::{record_patch_failure, start_view_span};

use crate::error::{Error, Result};

/// Configuration for telemetry initialization.
pub struct TelemetryConfig {
    /// Filter used when `RUST_LOG` is not set (e.g. "info", "transcript_rs=debug").
    pub log_level: String,
    /// Compact single-line output instead of the full fmt layout.
    pub compact: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            compact: false,
        }
    }
}

/// Initialize the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if the fallback filter does not parse or a global
/// subscriber was already set.
pub fn init_telemetry(config: TelemetryConfig) -> Result<()> {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::layer::SubscriberExt as _;
    use tracing_subscriber::util::SubscriberInitExt as _;

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level)
            .map_err(|e| Error::Config(format!("bad log level {:?}: {e}", config.log_level)))?,
    };

    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    let registry = tracing_subscriber::registry().with(env_filter);
    let result = if config.compact {
        registry.with(fmt_layer.compact()).try_init()
    } else {
        registry.with(fmt_layer).try_init()
    };
    result.map_err(|e| Error::Other(format!("failed to init tracing subscriber: {e}")))
}
