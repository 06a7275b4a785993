//! # Observability
//!
//! Tracing setup shared by every crate in the account-link workspace.
//!
//! Crates are **log producers** only. Binaries call [`init_with_config`] once
//! at startup and everything else uses the standard `tracing` macros.
//!
//! Two sinks are supported:
//!
//! - compact human-readable output on stderr (default)
//! - structured JSONL appended to a file when [`LogConfig::log_path`] is set,
//!   optionally mirrored to stderr. Event fields are flattened into each
//!   line next to `timestamp`, `level`, `target` and `message`.
//!
//! ```rust,ignore
//! fn main() {
//!     observability::init_with_config(observability::LogConfig {
//!         service_name: "anon-link".into(),
//!         default_level: "debug".into(),
//!         ..Default::default()
//!     });
//!
//!     tracing::info!("ready");
//! }
//! ```

mod file_sink;

use std::path::PathBuf;

pub use file_sink::{AppendLogWriter, WriterFactory};

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service, recorded when the file sink starts.
    pub service_name: String,

    /// Default log level filter (e.g., "debug", "info", "warn").
    /// Can be overridden by `RUST_LOG` environment variable.
    pub default_level: String,

    /// Append structured JSONL to this file instead of writing to stderr.
    pub log_path: Option<PathBuf>,

    /// Also emit compact logs to stderr when writing to a file.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: false,
        }
    }
}

/// Initialize the observability layer with custom configuration.
///
/// Calling this more than once is harmless: later calls leave the first
/// subscriber installed.
pub fn init_with_config(config: LogConfig) {
    match config.log_path.clone() {
        Some(path) => {
            if let Err(e) = file_sink::init_file_subscriber(&config, &path) {
                // Fall back to stderr so the process still has logs.
                init_stderr(&config.default_level);
                tracing::warn!(
                    log_path = %path.display(),
                    error = %e,
                    "failed to open log file, logging to stderr"
                );
            }
        }
        None => init_stderr(&config.default_level),
    }
}

fn init_stderr(default_level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

pub(crate) fn env_filter(default_level: &str) -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level))
}

/// Re-export tracing macros for convenience.
pub use tracing::{debug, error, info, instrument, trace, warn};
