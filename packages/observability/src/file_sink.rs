//! Central JSONL log file sink.
//!
//! Writes structured log lines to a single append-only file. Each line is
//! flushed as soon as it is written so several console processes can share
//! the same file.

use crate::json_layer::JsonLayer;
use crate::LogConfig;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Default log file location: `~/.qa-console/logs/console.jsonl`.
fn default_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".qa-console").join("logs").join("console.jsonl"))
}

/// Line-flushed file writer shared by every event.
#[derive(Clone)]
pub struct CentralLogWriter {
    inner: Arc<Mutex<BufWriter<File>>>,
}

impl CentralLogWriter {
    pub fn new(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            inner: Arc::new(Mutex::new(BufWriter::with_capacity(8192, file))),
        })
    }
}

impl io::Write for CentralLogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self.inner.lock();
        let result = guard.write(buf);
        guard.flush()?;
        result
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.lock().flush()
    }
}

/// MakeWriter implementation for tracing-subscriber
#[derive(Clone)]
pub struct WriterFactory {
    writer: CentralLogWriter,
}

impl<'a> MakeWriter<'a> for WriterFactory {
    type Writer = CentralLogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.writer.clone()
    }
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Install the global subscriber: JSONL file layer plus optional stderr layer.
pub fn init_subscriber(config: &LogConfig) {
    let log_path = config.log_path.clone().or_else(default_log_path);

    let writer = match log_path.as_deref().map(CentralLogWriter::new) {
        Some(Ok(writer)) => Some(writer),
        Some(Err(e)) => {
            eprintln!("failed to open log file {:?}: {}", log_path, e);
            None
        }
        None => None,
    };

    let json_layer = writer.map(|writer| {
        JsonLayer::new(config.service_name.clone(), WriterFactory { writer })
            .with_filter(env_filter(&config.default_level))
    });

    // Without a file sink, stderr is the only place logs can go.
    let stderr_layer = if config.also_stderr || json_layer.is_none() {
        Some(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_file(false)
                .with_line_number(false)
                .compact()
                .with_writer(io::stderr)
                .with_ansi(true)
                .with_filter(env_filter(&config.default_level)),
        )
    } else {
        None
    };

    let installed = tracing_subscriber::registry()
        .with(json_layer)
        .with(stderr_layer)
        .try_init();

    if installed.is_ok() {
        tracing::debug!(
            log_path = ?log_path,
            service = %config.service_name,
            "observability initialized"
        );
    }
}
