//! JSONL event layer with credential redaction.
//!
//! One line per event: `ts`, `level`, `service`, `pid`, `target`, `message`
//! and, when present, a `fields` object. Spans are not recorded; the console
//! logs flat events only.

use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::io::Write;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

/// Replacement value written for credential-bearing fields.
pub const REDACTED: &str = "[REDACTED]";

const SENSITIVE_FIELDS: [&str; 9] = [
    "token",
    "access_token",
    "refresh_token",
    "refresh_token_id",
    "id_token",
    "authorization",
    "cookie",
    "password",
    "secret",
];

/// Whether a field with this name must never be written verbatim.
pub fn is_sensitive_field(name: &str) -> bool {
    SENSITIVE_FIELDS
        .iter()
        .any(|key| name.eq_ignore_ascii_case(key))
}

#[derive(Serialize)]
struct Line<'a> {
    ts: String,
    level: &'static str,
    service: &'a str,
    pid: u32,
    target: &'a str,
    message: String,
    #[serde(skip_serializing_if = "Map::is_empty")]
    fields: Map<String, Value>,
}

#[derive(Default)]
struct Fields {
    message: String,
    values: Map<String, Value>,
}

impl Fields {
    fn put(&mut self, field: &Field, value: Value) {
        let value = if is_sensitive_field(field.name()) {
            Value::from(REDACTED)
        } else {
            value
        };
        self.values.insert(field.name().to_string(), value);
    }
}

impl Visit for Fields {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let rendered = format!("{:?}", value);
        match field.name() {
            "message" => self.message = rendered,
            _ => self.put(field, Value::from(rendered)),
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = value.to_string(),
            _ => self.put(field, Value::from(value)),
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.put(field, Value::from(value.to_string()));
    }
}

/// Writes every event as one JSON line to `make_writer`.
pub struct JsonLayer<W> {
    service_name: String,
    pid: u32,
    make_writer: W,
}

impl<W> JsonLayer<W> {
    pub fn new(service_name: String, make_writer: W) -> Self {
        Self {
            service_name,
            pid: std::process::id(),
            make_writer,
        }
    }
}

impl<S, W> Layer<S> for JsonLayer<W>
where
    S: Subscriber,
    W: for<'writer> MakeWriter<'writer> + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut fields = Fields::default();
        event.record(&mut fields);

        let metadata = event.metadata();
        let line = Line {
            ts: Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            level: metadata.level().as_str(),
            service: &self.service_name,
            pid: self.pid,
            target: metadata.target(),
            message: fields.message,
            fields: fields.values,
        };

        if let Ok(json) = serde_json::to_string(&line) {
            let _ = writeln!(self.make_writer.make_writer(), "{}", json);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::io;
    use std::sync::Arc;
    use tracing_subscriber::layer::SubscriberExt;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Capture {
        type Writer = Capture;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn capture_lines(emit: impl FnOnce()) -> Vec<Value> {
        let capture = Capture::default();
        let subscriber = tracing_subscriber::registry()
            .with(JsonLayer::new("qa-console".into(), capture.clone()));
        tracing::subscriber::with_default(subscriber, emit);

        let raw = String::from_utf8(capture.0.lock().clone()).unwrap();
        raw.lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_event_becomes_one_json_line() {
        let lines = capture_lines(|| {
            tracing::info!(status = 401u64, path = "/audits", "request unauthorized");
        });

        assert_eq!(lines.len(), 1);
        let line = &lines[0];
        assert_eq!(line["level"], "INFO");
        assert_eq!(line["service"], "qa-console");
        assert_eq!(line["message"], "request unauthorized");
        assert_eq!(line["fields"]["status"], 401);
        assert_eq!(line["fields"]["path"], "/audits");
        assert_eq!(line["pid"], std::process::id());
    }

    #[test]
    fn test_credentials_are_redacted() {
        let lines = capture_lines(|| {
            tracing::warn!(
                access_token = "eyJhbGciOi.payload.sig",
                refresh_token_id = "rt-77",
                "refresh failed"
            );
        });

        let fields = &lines[0]["fields"];
        assert_eq!(fields["access_token"], REDACTED);
        assert_eq!(fields["refresh_token_id"], REDACTED);
        assert!(!lines[0].to_string().contains("rt-77"));
    }

    #[test]
    fn test_fields_omitted_when_empty() {
        let lines = capture_lines(|| tracing::debug!("session ended"));
        assert!(lines[0].get("fields").is_none());
    }

    #[test]
    fn test_sensitive_fields() {
        assert!(is_sensitive_field("access_token"));
        assert!(is_sensitive_field("Authorization"));
        assert!(is_sensitive_field("refresh_token_id"));
        assert!(!is_sensitive_field("status"));
        assert!(!is_sensitive_field("user_email"));
    }
}
