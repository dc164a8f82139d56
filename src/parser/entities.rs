use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::{Map, Value};

/// A single structured log entry, produced once per parsed header line.
///
/// Continuation lines (stack traces and other non-header lines) are folded
/// into `message`; the entry keeps the line number of its header line.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    /// Timestamp from the entry header; the Unix epoch when unparsable
    pub datetime: NaiveDateTime,
    /// Logical subsystem that emitted the entry (e.g. "security", "app")
    pub channel: String,
    /// Severity, normalized to uppercase (e.g. "ERROR", "INFO")
    pub level: String,
    /// Primary text, with continuation-line newlines preserved
    pub message: String,
    /// Decoded call-site data; empty when the entry carried none
    pub context: Map<String, Value>,
    /// Decoded framework-injected metadata; same shape as context
    pub extra: Map<String, Value>,
    /// Origin file, relative to the log root
    pub source_file: String,
    /// 1-based physical line number where the entry began
    pub line_number: usize,
}

impl LogEntry {
    /// Append a continuation line to the message, preserving the newline.
    pub fn append_line(&mut self, line: &str) {
        self.message.push('\n');
        self.message.push_str(line);
    }

    /// Look up a context value by key.
    pub fn context_value(&self, key: &str) -> Option<&Value> {
        self.context.get(key)
    }
}
