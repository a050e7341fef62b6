//! # Observability
//!
//! Centralized logging layer for the QA console workspace.
//!
//! Crates are **log producers** only. The binary calls
//! `observability::init_with_config()` once at startup and every crate uses
//! the standard `tracing` macros. Nothing outside this crate knows where the
//! log lines end up.
//!
//! All lines are written as structured JSONL to
//! `~/.qa-console/logs/console.jsonl`, so the stream can be followed with
//! `tail -f ~/.qa-console/logs/console.jsonl | jq`.
//!
//! Fields that carry credentials (`access_token`, `authorization`, ...) are
//! redacted before they reach the file.
//!
//! ## Usage
//!
//! ```rust,ignore
//! fn main() {
//!     observability::init_with_config(observability::LogConfig {
//!         service_name: "qa-console".into(),
//!         default_level: "debug".into(),
//!         also_stderr: true,
//!         ..Default::default()
//!     });
//!
//!     tracing::info!("console started");
//! }
//! ```

mod file_sink;
mod json_layer;

use std::path::PathBuf;

pub use json_layer::{is_sensitive_field, REDACTED};

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service (e.g., "qa-console").
    /// Included in every log line for filtering.
    pub service_name: String,

    /// Default log level filter (e.g., "debug", "info", "warn").
    /// Can be overridden by `RUST_LOG` environment variable.
    pub default_level: String,

    /// Optional custom log file path.
    /// Defaults to `~/.qa-console/logs/console.jsonl`.
    pub log_path: Option<PathBuf>,

    /// Also emit logs to stderr for immediate feedback.
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
/// If the log file cannot be opened the subscriber falls back to stderr
/// only, so a read-only home directory never prevents the process from
/// starting.
pub fn init_with_config(config: LogConfig) {
    file_sink::init_subscriber(&config);
}
