//! Tracing setup and in-memory log capture.
//!
//! [`init`] installs the process-wide subscriber. Besides printing, it keeps
//! the most recent events in a [`LogBuffer`] so `show logging` can display
//! them to console users.

use std::collections::VecDeque;
use std::fmt::Write as _;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use tracing::{Level, Subscriber};
use tracing_subscriber::field::Visit;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Layer};

/// Number of records kept by [`init`].
pub const DEFAULT_CAPACITY: usize = 1000;

/// A captured log event.
#[derive(Debug, Clone)]
pub struct LogRecord {
    /// When the event was recorded.
    pub time: DateTime<Utc>,
    /// Verbosity level.
    pub level: Level,
    /// Module or target the event came from.
    pub target: String,
    /// The message, followed by any other fields as `key=value`.
    pub message: String,
}

/// Bounded, shared buffer of recent log records.
///
/// Cloning is cheap; all clones see the same records.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    records: Arc<Mutex<VecDeque<LogRecord>>>,
    capacity: usize,
}

impl LogBuffer {
    /// Create a buffer keeping at most `capacity` records.
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Arc::new(Mutex::new(VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY)))),
            capacity,
        }
    }

    /// Append a record, evicting the oldest when full.
    pub fn push(&self, record: LogRecord) {
        if self.capacity == 0 {
            return;
        }
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }

    /// The last `n` records, oldest first.
    pub fn recent(&self, n: usize) -> Vec<LogRecord> {
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        let skip = records.len().saturating_sub(n);
        records.iter().skip(skip).cloned().collect()
    }

    /// Number of records held.
    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether no records are held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// A [`Layer`] that copies events into a [`LogBuffer`].
pub struct LogCaptureLayer {
    buffer: LogBuffer,
}

impl LogCaptureLayer {
    /// Capture into `buffer`.
    pub fn new(buffer: LogBuffer) -> Self {
        Self { buffer }
    }
}

impl<S: Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>> Layer<S> for LogCaptureLayer {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = LogEventVisitor::default();
        event.record(&mut visitor);

        let metadata = event.metadata();
        self.buffer.push(LogRecord {
            time: Utc::now(),
            level: *metadata.level(),
            target: metadata.target().to_string(),
            message: visitor.finish(),
        });
    }
}

/// Collects the `message` field and appends the others.
#[derive(Default)]
struct LogEventVisitor {
    message: String,
    fields: String,
}

impl LogEventVisitor {
    fn finish(self) -> String {
        let text = match (self.message.is_empty(), self.fields.is_empty()) {
            (_, true) => self.message,
            (true, false) => self.fields,
            (false, false) => format!("{} {}", self.message, self.fields),
        };
        // Records are shown one per table row.
        if text.contains(['\r', '\n']) {
            text.replace("\r\n", " ").replace(['\r', '\n'], " ")
        } else {
            text
        }
    }
}

impl Visit for LogEventVisitor {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.record_debug(field, &value);
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            if !self.fields.is_empty() {
                self.fields.push(' ');
            }
            let _ = write!(self.fields, "{}={:?}", field.name(), value);
        }
    }
}

/// Install the global subscriber and return the capture buffer.
///
/// `RUST_LOG` takes precedence over `default_filter`.
pub fn init(default_filter: &str) -> Result<LogBuffer, TryInitError> {
    let buffer = LogBuffer::default();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(LogCaptureLayer::new(buffer.clone()))
        .try_init()?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(message: &str) -> LogRecord {
        LogRecord {
            time: Utc::now(),
            level: Level::INFO,
            target: "test".into(),
            message: message.into(),
        }
    }

    #[test]
    fn test_buffer_bounded() {
        let buffer = LogBuffer::new(2);
        buffer.push(record("a"));
        buffer.push(record("b"));
        buffer.push(record("c"));

        let messages: Vec<String> = buffer.recent(10).into_iter().map(|r| r.message).collect();
        assert_eq!(messages, vec!["b", "c"]);
        assert_eq!(buffer.recent(1)[0].message, "c");
        assert!(buffer.recent(0).is_empty());
    }

    #[test]
    fn test_clones_share_records() {
        let buffer = LogBuffer::new(4);
        let clone = buffer.clone();
        clone.push(record("shared"));
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_layer_captures_events() {
        let buffer = LogBuffer::new(8);
        let subscriber = tracing_subscriber::registry().with(LogCaptureLayer::new(buffer.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(port = 55220, "listening");
            tracing::warn!("auth failed");
        });

        let records = buffer.recent(8);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].level, Level::INFO);
        assert_eq!(records[0].message, "listening port=55220");
        assert_eq!(records[1].level, Level::WARN);
        assert_eq!(records[1].message, "auth failed");
    }

    #[test]
    fn test_multiline_message_flattened() {
        let buffer = LogBuffer::new(8);
        let subscriber = tracing_subscriber::registry().with(LogCaptureLayer::new(buffer.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::error!("fetch failed:\nconnection refused\r\nretrying");
        });

        assert_eq!(buffer.recent(1)[0].message, "fetch failed: connection refused retrying");
    }
}
