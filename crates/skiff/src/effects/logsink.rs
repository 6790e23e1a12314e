//! Request/response logging.
//!
//! Logging is a capability selected at construction: the client calls
//! `write` on whatever sink it was built with, it never resolves a
//! logger dynamically.

use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    Request,
    Response,
}

impl LogKind {
    fn label(&self) -> &'static str {
        match self {
            LogKind::Request => "request",
            LogKind::Response => "response",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogRecord {
    pub kind: LogKind,
    pub body: serde_json::Value,
}

impl LogRecord {
    pub fn request(body: serde_json::Value) -> Self {
        Self { kind: LogKind::Request, body }
    }

    pub fn response(body: serde_json::Value) -> Self {
        Self { kind: LogKind::Response, body }
    }
}

pub trait LogSink {
    fn write(&self, record: &LogRecord);
}

/// Default sink: forwards records to the `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn write(&self, record: &LogRecord) {
        tracing::info!(target: "skiff::log", kind = record.kind.label(), body = %record.body);
    }
}

/// Appends one line per record to a file. Write failures are reported
/// through tracing and otherwise swallowed; logging never fails a
/// dispatch.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn append(&self, record: &LogRecord) -> std::io::Result<()> {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}: {}", record.kind.label(), record.body)
    }
}

impl LogSink for FileSink {
    fn write(&self, record: &LogRecord) {
        if let Err(err) = self.append(record) {
            tracing::warn!(error = %err, path = %self.path.display(), "failed to write log record");
        }
    }
}
