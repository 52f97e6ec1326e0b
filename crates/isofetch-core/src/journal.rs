//! Run journal: structured log entries for one batch, exportable as text.
//!
//! The batch loop writes to a `LogSink`; `RunJournal` keeps the entries in
//! memory, mirrors each one to `tracing`, and renders a report that can be
//! saved next to the exported polygons.

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

/// Entry type, as shown in the report header of each entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Info,
    Request,
    Response,
    Success,
    Error,
    Retry,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryKind::Info => "info",
            EntryKind::Request => "request",
            EntryKind::Response => "response",
            EntryKind::Success => "success",
            EntryKind::Error => "error",
            EntryKind::Retry => "retry",
        }
    }
}

/// One journal entry. `data` is free-form JSON (`Value::Null` when empty).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub message: String,
    pub data: Value,
}

impl LogEntry {
    pub fn new(kind: EntryKind, message: impl Into<String>, data: Value) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
            message: message.into(),
            data,
        }
    }

    pub fn info(message: impl Into<String>, data: Value) -> Self {
        Self::new(EntryKind::Info, message, data)
    }

    pub fn request(message: impl Into<String>, data: Value) -> Self {
        Self::new(EntryKind::Request, message, data)
    }

    pub fn response(message: impl Into<String>, data: Value) -> Self {
        Self::new(EntryKind::Response, message, data)
    }

    pub fn success(message: impl Into<String>, data: Value) -> Self {
        Self::new(EntryKind::Success, message, data)
    }

    pub fn error(message: impl Into<String>, data: Value) -> Self {
        Self::new(EntryKind::Error, message, data)
    }

    pub fn retry(message: impl Into<String>, data: Value) -> Self {
        Self::new(EntryKind::Retry, message, data)
    }

    fn has_data(&self) -> bool {
        match &self.data {
            Value::Null => false,
            Value::Object(map) => !map.is_empty(),
            _ => true,
        }
    }
}

/// Destination for batch diagnostics.
pub trait LogSink: Send + Sync {
    fn append(&self, entry: LogEntry);
}

/// Sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl LogSink for NullSink {
    fn append(&self, _entry: LogEntry) {}
}

/// In-memory journal for one run.
#[derive(Debug, Default)]
pub struct RunJournal {
    entries: Mutex<Vec<LogEntry>>,
}

impl RunJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all entries in append order.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Plain-text report: header with start/end/duration, then numbered entries.
    /// Start and end are the first and last entry timestamps.
    pub fn render_text(&self) -> String {
        let entries = self.entries();
        let start = entries.first().map(|e| e.timestamp);
        let end = entries.last().map(|e| e.timestamp);

        let mut out = String::from("=== ISOCHRONE CREATION LOG ===\n\n");
        let _ = writeln!(out, "Start Time: {}", fmt_time(start));
        let _ = writeln!(out, "End Time: {}", fmt_time(end));
        if let (Some(start), Some(end)) = (start, end) {
            let secs = (end - start).num_milliseconds() as f64 / 1000.0;
            let _ = writeln!(out, "Total Duration: {:.2} seconds", secs);
        }
        let _ = writeln!(out, "Total Entries: {}\n", entries.len());
        out.push_str("=== DETAILED LOG ENTRIES ===\n\n");

        for (i, entry) in entries.iter().enumerate() {
            let _ = writeln!(
                out,
                "[{}] [{}] [{}]",
                i + 1,
                entry.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
                entry.kind.as_str().to_uppercase()
            );
            let _ = writeln!(out, "Message: {}", entry.message);
            if entry.has_data() {
                let data = serde_json::to_string_pretty(&entry.data)
                    .unwrap_or_else(|_| entry.data.to_string());
                let _ = writeln!(out, "Data: {}", data);
            }
            out.push('\n');
        }
        out
    }

    /// Write the text report to `path`.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.render_text())
            .with_context(|| format!("write run log {}", path.display()))
    }

    /// Default report name, e.g. `isochrone_log_2026-10-16T09-30-00-123Z.txt`.
    pub fn default_file_name(now: DateTime<Utc>) -> String {
        let stamp = now
            .to_rfc3339_opts(SecondsFormat::Millis, true)
            .replace([':', '.'], "-");
        format!("isochrone_log_{stamp}.txt")
    }
}

impl LogSink for RunJournal {
    fn append(&self, entry: LogEntry) {
        match entry.kind {
            EntryKind::Error => tracing::error!(data = %entry.data, "{}", entry.message),
            EntryKind::Retry => tracing::warn!(data = %entry.data, "{}", entry.message),
            EntryKind::Request | EntryKind::Response => {
                tracing::debug!(data = %entry.data, "{}", entry.message)
            }
            EntryKind::Info | EntryKind::Success => {
                tracing::info!(data = %entry.data, "{}", entry.message)
            }
        }
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }
}

fn fmt_time(t: Option<DateTime<Utc>>) -> String {
    t.map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| "N/A".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn appends_in_order() {
        let journal = RunJournal::new();
        assert!(journal.is_empty());
        journal.append(LogEntry::info("first", Value::Null));
        journal.append(LogEntry::retry("second", json!({"attempt": 1})));
        let entries = journal.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "first");
        assert_eq!(entries[1].kind, EntryKind::Retry);
        assert_eq!(journal.len(), 2);
    }

    #[test]
    fn render_text_includes_header_and_entries() {
        let journal = RunJournal::new();
        journal.append(LogEntry::info("Starting", json!({"total": 2})));
        journal.append(LogEntry::error("Failed", json!({})));
        let text = journal.render_text();
        assert!(text.starts_with("=== ISOCHRONE CREATION LOG ==="));
        assert!(text.contains("Total Entries: 2"));
        assert!(text.contains("Total Duration:"));
        assert!(text.contains("[1] ["));
        assert!(text.contains("[INFO]"));
        assert!(text.contains("[2] ["));
        assert!(text.contains("[ERROR]"));
        assert!(text.contains("\"total\": 2"));
        // Empty data objects are not printed.
        assert_eq!(text.matches("Data:").count(), 1);
    }

    #[test]
    fn render_text_of_empty_journal() {
        let text = RunJournal::new().render_text();
        assert!(text.contains("Start Time: N/A"));
        assert!(text.contains("Total Entries: 0"));
        assert!(!text.contains("Total Duration"));
    }

    #[test]
    fn entry_serializes_with_type_field() {
        let entry = LogEntry::request("API request", json!({"station": "A"}));
        let v = serde_json::to_value(&entry).unwrap();
        assert_eq!(v["type"], "request");
        assert_eq!(v["data"]["station"], "A");
    }

    #[test]
    fn default_file_name_has_no_colons() {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 9, 30, 0).unwrap();
        assert_eq!(
            RunJournal::default_file_name(now),
            "isochrone_log_2026-10-16T09-30-00-000Z.txt"
        );
    }

    #[test]
    fn write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.txt");
        let journal = RunJournal::new();
        journal.append(LogEntry::success("done", Value::Null));
        journal.write_to(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("Message: done"));
    }
}
