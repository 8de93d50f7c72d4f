//! Telemetry and Observability
//!
//! Handles setting up `tracing-subscriber` for structured logging.
//! Supports config-driven log levels, environment variable overrides,
//! format switching between pretty (debug) and JSON (release), and an
//! optional plain-text log file.
//!
//! Console output goes to stderr so it never interleaves with answers
//! printed on stdout.

use sdk::errors::EngineError;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the default filter directive for a level.
///
/// Noisy dependency targets are capped at `warn`.
pub fn filter_directive(log_level: &str) -> String {
    format!(
        "{level},recall_engine={level},recall={level},sqlx=warn,hyper=warn,reqwest=warn",
        level = log_level
    )
}

/// Initialize the tracing subscriber.
///
/// Priority: `RUST_LOG` env var > `log_level` parameter.
///
/// In debug builds: pretty-printed terminal output.
/// In release builds: JSON structured output with spans.
///
/// When `log_file` is set, every event is additionally appended to that file
/// without ANSI colors.
pub fn init_telemetry_with_level(log_level: &str, log_file: Option<&Path>) -> Result<(), EngineError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(log_level)));

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    #[cfg(debug_assertions)]
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .pretty()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .with(file_layer)
            .try_init()
            .ok();
    }

    #[cfg(not(debug_assertions))]
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(std::io::stderr),
            )
            .with(file_layer)
            .try_init()
            .ok();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive_parses() {
        for level in ["error", "warn", "info", "debug", "trace"] {
            let directive = filter_directive(level);
            assert!(directive.starts_with(level));
            assert!(EnvFilter::try_new(&directive).is_ok());
        }
    }

    #[test]
    fn test_log_file_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("recall.log");
        init_telemetry_with_level("info", Some(&path)).unwrap();
        assert!(path.exists());
    }
}
