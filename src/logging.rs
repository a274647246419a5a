//! Diagnostic log for chat invocations.
//!
//! Entries are appended to a JSONL file, kept in a bounded in-memory ring for
//! inspection, and mirrored to `tracing`. `RequestLog` tags every entry of one
//! invocation with the same request id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

const MAX_LOG_ENTRIES: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub component: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<Uuid>,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: LogLevel, component: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            component: component.into(),
            request_id: None,
            message: message.into(),
        }
    }

    pub fn with_request_id(mut self, id: Uuid) -> Self {
        self.request_id = Some(id);
        self
    }

    fn emit_tracing(&self) {
        let request_id = self.request_id.map(|id| id.to_string()).unwrap_or_default();
        match self.level {
            LogLevel::Debug => {
                tracing::debug!(component = %self.component, request_id = %request_id, "{}", self.message);
            }
            LogLevel::Info => {
                tracing::info!(component = %self.component, request_id = %request_id, "{}", self.message);
            }
            LogLevel::Warn => {
                tracing::warn!(component = %self.component, request_id = %request_id, "{}", self.message);
            }
            LogLevel::Error => {
                tracing::error!(component = %self.component, request_id = %request_id, "{}", self.message);
            }
        }
    }
}

/// Ring-buffer logger that persists to JSONL.
pub struct Logger {
    entries: VecDeque<LogEntry>,
    writer: BufWriter<File>,
}

impl Logger {
    /// Open (or create) the log file, loading the tail of any existing entries.
    pub fn new(file_path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file_path = file_path.as_ref();

        if let Some(parent) = file_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut entries = VecDeque::with_capacity(MAX_LOG_ENTRIES);

        if file_path.exists() {
            let reader = BufReader::new(File::open(file_path)?);
            for line in reader.lines().map_while(std::result::Result::ok) {
                if let Ok(entry) = serde_json::from_str::<LogEntry>(&line) {
                    if entries.len() >= MAX_LOG_ENTRIES {
                        entries.pop_front();
                    }
                    entries.push_back(entry);
                }
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file_path)?;

        Ok(Self {
            entries,
            writer: BufWriter::new(file),
        })
    }

    pub fn log(&mut self, entry: LogEntry) {
        if let Ok(json) = serde_json::to_string(&entry) {
            let _ = writeln!(self.writer, "{}", json);
            let _ = self.writer.flush();
        }
        if self.entries.len() >= MAX_LOG_ENTRIES {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Most recent entries, newest first.
    pub fn recent(&self, limit: usize) -> Vec<LogEntry> {
        self.entries.iter().rev().take(limit).cloned().collect()
    }
}

#[derive(Clone)]
pub struct SharedLogger(Arc<Mutex<Logger>>);

impl SharedLogger {
    pub fn new(file_path: impl AsRef<Path>) -> std::io::Result<Self> {
        Ok(Self(Arc::new(Mutex::new(Logger::new(file_path)?))))
    }

    pub fn log(&self, entry: LogEntry) {
        entry.emit_tracing();
        if let Ok(mut logger) = self.0.lock() {
            logger.log(entry);
        }
    }

    pub fn info(&self, component: impl Into<String>, message: impl Into<String>) {
        self.log(LogEntry::new(LogLevel::Info, component, message));
    }

    /// A logger for one invocation; every entry carries a fresh request id.
    pub fn for_request(&self) -> RequestLog {
        RequestLog {
            logger: self.clone(),
            request_id: Uuid::new_v4(),
        }
    }

    pub fn recent(&self, limit: usize) -> Vec<LogEntry> {
        self.0.lock().map(|l| l.recent(limit)).unwrap_or_default()
    }
}

#[derive(Clone)]
pub struct RequestLog {
    logger: SharedLogger,
    request_id: Uuid,
}

impl RequestLog {
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    fn log(&self, level: LogLevel, component: &str, message: String) {
        self.logger
            .log(LogEntry::new(level, component, message).with_request_id(self.request_id));
    }

    pub fn debug(&self, component: &str, message: impl Into<String>) {
        self.log(LogLevel::Debug, component, message.into());
    }

    pub fn info(&self, component: &str, message: impl Into<String>) {
        self.log(LogLevel::Info, component, message.into());
    }

    pub fn warn(&self, component: &str, message: impl Into<String>) {
        self.log(LogLevel::Warn, component, message.into());
    }

    pub fn error(&self, component: &str, message: impl Into<String>) {
        self.log(LogLevel::Error, component, message.into());
    }
}

/// Cut `s` to at most `max` bytes without splitting a UTF-8 character.
pub fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_request_log_tags_entries() {
        let dir = tempdir().unwrap();
        let logger = SharedLogger::new(dir.path().join("proxy.log")).unwrap();

        let first = logger.for_request();
        let second = logger.for_request();
        assert_ne!(first.request_id(), second.request_id());

        first.info("proxy", "POST upstream");
        second.warn("proxy", "Upstream error");
        logger.info("startup", "ready");

        let recent = logger.recent(10);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].component, "startup");
        assert!(recent[0].request_id.is_none());
        assert_eq!(recent[1].request_id, Some(second.request_id()));
        assert_eq!(recent[1].level, LogLevel::Warn);
        assert_eq!(recent[2].request_id, Some(first.request_id()));
        assert_eq!(recent[2].message, "POST upstream");
    }

    #[test]
    fn test_entries_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("proxy.log");

        {
            let logger = SharedLogger::new(&path).unwrap();
            logger.info("server", "boom");
            logger.info("server", "after");
        }

        let reopened = SharedLogger::new(&path).unwrap();
        let recent = reopened.recent(1);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].message, "after");
        assert_eq!(reopened.recent(usize::MAX).len(), 2);
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello", 3), "hel");
        // 'é' is two bytes; cutting inside it backs off to the previous boundary
        assert_eq!(truncate("héllo", 2), "h");
    }
}
