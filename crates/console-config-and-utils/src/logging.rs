//! Logging initialization for the console.
//!
//! Thin wrapper over the observability crate. Every console process writes
//! structured JSONL to `~/.qa-console/logs/console.jsonl`.

use observability::LogConfig;
use std::path::PathBuf;

const SERVICE_NAME: &str = "qa-console";

/// Initialize the logging system.
///
/// * `level` - Default log level (trace, debug, info, warn, error). `RUST_LOG`
///   takes precedence when set.
///
/// ```ignore
/// init_logging("info");
/// tracing::info!("console started");
/// ```
pub fn init_logging(level: &str) {
    install(level, None);
}

/// Initialize logging, writing the JSONL file at `log_file` instead of the
/// default location.
pub fn init_logging_to(level: &str, log_file: PathBuf) {
    install(level, Some(log_file));
}

fn install(level: &str, log_path: Option<PathBuf>) {
    observability::init_with_config(LogConfig {
        service_name: SERVICE_NAME.into(),
        default_level: parse_level(level).to_string().to_ascii_lowercase(),
        log_path,
        also_stderr: false,
    });
}

/// Parse a log level string into a tracing Level.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
