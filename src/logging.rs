//! Append-only file sink for protocol log events.
//!
//! One line per event: `[LEVEL] YYYY-MM-DD HH:MM:SS <message>`. The sink is
//! shared across connection workers behind the server's critical section,
//! which is what keeps lines from interleaving.

use chrono::{DateTime, Local};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Event severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Debug,
    Warning,
    Error,
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
        };
        f.write_str(name)
    }
}

/// One protocol log event.
///
/// The timestamp is captured when the event is constructed; the order in
/// the file is decided later, by whoever holds the critical section.
#[derive(Debug, Clone)]
pub struct LogEvent {
    pub level: Level,
    pub timestamp: DateTime<Local>,
    pub message: String,
}

impl LogEvent {
    /// Create an event stamped with the current local time.
    pub fn new(level: Level, message: String) -> Self {
        LogEvent {
            level,
            timestamp: Local::now(),
            message,
        }
    }

    /// An INFO event.
    pub fn info(message: String) -> Self {
        Self::new(Level::Info, message)
    }

    /// A DEBUG event.
    pub fn debug(message: String) -> Self {
        Self::new(Level::Debug, message)
    }

    /// A WARNING event.
    pub fn warning(message: String) -> Self {
        Self::new(Level::Warning, message)
    }

    /// An ERROR event.
    pub fn error(message: String) -> Self {
        Self::new(Level::Error, message)
    }

    /// Render the event as one log line, without the trailing newline.
    pub fn format(&self) -> String {
        format!(
            "[{}] {} {}",
            self.level,
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.message
        )
    }
}

/// Append-only log file.
pub struct LogSink {
    file: Option<File>,
}

impl LogSink {
    /// Open (or create) the log file for appending.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(LogSink { file: Some(file) })
    }

    /// Append one event as a single line.
    ///
    /// Events arriving after `close` are dropped: shutdown does not drain
    /// in-flight workers, so late stragglers have nowhere to go.
    pub fn append(&mut self, event: &LogEvent) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => writeln!(file, "{}", event.format()),
            None => Ok(()),
        }
    }

    /// Flush and close the file. Safe to call more than once.
    pub fn close(&mut self) -> io::Result<()> {
        match self.file.take() {
            Some(mut file) => file.flush(),
            None => Ok(()),
        }
    }

    /// True once `close` has run.
    pub fn is_closed(&self) -> bool {
        self.file.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_level_names() {
        assert_eq!(Level::Info.to_string(), "INFO");
        assert_eq!(Level::Debug.to_string(), "DEBUG");
        assert_eq!(Level::Warning.to_string(), "WARNING");
        assert_eq!(Level::Error.to_string(), "ERROR");
    }

    #[test]
    fn test_event_format_shape() {
        let event = LogEvent::warning("Unknown request type: \"BOGUS\"".to_string());
        let line = event.format();

        assert!(line.starts_with("[WARNING] "));
        assert!(line.ends_with("Unknown request type: \"BOGUS\""));

        // Timestamp occupies exactly 19 characters between tag and message.
        let rest = &line["[WARNING] ".len()..];
        assert_eq!(rest.as_bytes()[19], b' ');
        assert_eq!(&rest[4..5], "-");
        assert_eq!(&rest[13..14], ":");
    }

    #[test]
    fn test_append_writes_one_line_per_event() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("events.log");

        let mut sink = LogSink::open(&path).unwrap();
        sink.append(&LogEvent::info("first".to_string())).unwrap();
        sink.append(&LogEvent::info("second".to_string())).unwrap();
        sink.close().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("first"));
        assert!(lines[1].ends_with("second"));
    }

    #[test]
    fn test_append_after_close_is_dropped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("events.log");

        let mut sink = LogSink::open(&path).unwrap();
        sink.close().unwrap();
        assert!(sink.is_closed());

        sink.append(&LogEvent::info("late".to_string())).unwrap();
        sink.close().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.is_empty());
    }

    #[test]
    fn test_open_appends_to_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("events.log");

        let mut sink = LogSink::open(&path).unwrap();
        sink.append(&LogEvent::info("before".to_string())).unwrap();
        sink.close().unwrap();

        let mut sink = LogSink::open(&path).unwrap();
        sink.append(&LogEvent::info("after".to_string())).unwrap();
        sink.close().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }
}
