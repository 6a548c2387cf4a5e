//! Typed activity events and the synchronous log that records them.
//!
//! Callers describe what happened with an [`ActivityEvent`]; this module maps it
//! onto a [`LogEntry`] and hands it to the JSONL writer. With no log path
//! configured the log is disabled and every `record` is a no-op.

#![allow(missing_docs)]

use std::path::PathBuf;

use crate::core::config::LoggingConfig;
use crate::counter::{FailureKind, FailureStage};
use crate::logger::jsonl::{EventType, JsonlConfig, JsonlWriter, LogEntry, Severity};
use crate::tally::MissingFilePolicy;

/// Events emitted by the tally driver and the fixture writer.
#[derive(Debug, Clone)]
pub enum ActivityEvent {
    RunStarted {
        directory: String,
        file_count: usize,
        policy: MissingFilePolicy,
    },
    FileCounted {
        index: usize,
        path: String,
        bytes: u64,
    },
    FileFailed {
        index: usize,
        path: String,
        stage: FailureStage,
        kind: FailureKind,
        message: String,
    },
    RunCompleted {
        files: usize,
        failed: usize,
        total_bytes: u64,
        duration_ms: u64,
    },
    FixtureWritten {
        index: usize,
        path: String,
        bytes: u64,
    },
    FixturesCompleted {
        files: usize,
        total_bytes: u64,
        duration_ms: u64,
    },
}

impl ActivityEvent {
    fn to_entry(&self) -> LogEntry {
        match self {
            Self::RunStarted {
                directory,
                file_count,
                policy,
            } => {
                let mut e = LogEntry::new(EventType::RunStart, Severity::Info);
                e.path = Some(directory.clone());
                e.file_count = Some(*file_count);
                e.details = Some(format!("missing_file={policy}"));
                e
            }
            Self::FileCounted { index, path, bytes } => {
                let mut e = LogEntry::new(EventType::FileCounted, Severity::Info);
                e.index = Some(*index);
                e.path = Some(path.clone());
                e.bytes = Some(*bytes);
                e.ok = Some(true);
                e
            }
            Self::FileFailed {
                index,
                path,
                stage,
                kind,
                message,
            } => {
                let mut e = LogEntry::new(EventType::FileError, Severity::Warning);
                e.index = Some(*index);
                e.path = Some(path.clone());
                e.ok = Some(false);
                e.stage = Some(stage.as_str().to_string());
                e.error_kind = Some(kind.as_str().to_string());
                e.error_message = Some(message.clone());
                e
            }
            Self::RunCompleted {
                files,
                failed,
                total_bytes,
                duration_ms,
            } => {
                let severity = if *failed > 0 {
                    Severity::Warning
                } else {
                    Severity::Info
                };
                let mut e = LogEntry::new(EventType::RunComplete, severity);
                e.file_count = Some(*files);
                e.failed = Some(*failed);
                e.total_bytes = Some(*total_bytes);
                e.duration_ms = Some(*duration_ms);
                e.ok = Some(*failed == 0);
                e
            }
            Self::FixtureWritten { index, path, bytes } => {
                let mut e = LogEntry::new(EventType::FixtureWrite, Severity::Info);
                e.index = Some(*index);
                e.path = Some(path.clone());
                e.bytes = Some(*bytes);
                e.ok = Some(true);
                e
            }
            Self::FixturesCompleted {
                files,
                total_bytes,
                duration_ms,
            } => {
                let mut e = LogEntry::new(EventType::FixturesComplete, Severity::Info);
                e.file_count = Some(*files);
                e.total_bytes = Some(*total_bytes);
                e.duration_ms = Some(*duration_ms);
                e
            }
        }
    }
}

/// Activity log handle; disabled unless a JSONL path is configured.
pub struct ActivityLog {
    writer: Option<JsonlWriter>,
    config_hash: Option<String>,
}

impl ActivityLog {
    /// A log that drops every event.
    pub fn disabled() -> Self {
        Self {
            writer: None,
            config_hash: None,
        }
    }

    /// Open the log described by `[logging]`, or a disabled one when no path is set.
    pub fn from_config(logging: &LoggingConfig) -> Self {
        logging
            .jsonl_log
            .clone()
            .map_or_else(Self::disabled, |path| Self::open(path, logging))
    }

    pub fn open(path: PathBuf, logging: &LoggingConfig) -> Self {
        Self {
            writer: Some(JsonlWriter::open(JsonlConfig::from_logging(path, logging))),
            config_hash: None,
        }
    }

    /// Stamp run-start entries with the effective config hash.
    #[must_use]
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    pub fn record(&mut self, event: &ActivityEvent) {
        let Some(writer) = self.writer.as_mut() else {
            return;
        };
        let mut entry = event.to_entry();
        if let (ActivityEvent::RunStarted { .. }, Some(hash)) = (event, &self.config_hash) {
            let details = entry.details.take().unwrap_or_default();
            entry.details = Some(format!("{details} config_hash={hash}"));
        }
        writer.write_entry(&entry);
    }

    pub fn flush(&mut self) {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn read_lines(path: &std::path::Path) -> Vec<serde_json::Value> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn disabled_log_records_nothing() {
        let mut log = ActivityLog::disabled();
        assert!(!log.is_enabled());
        log.record(&ActivityEvent::RunCompleted {
            files: 1,
            failed: 0,
            total_bytes: 1,
            duration_ms: 0,
        });
        log.flush();
    }

    #[test]
    fn from_config_without_path_is_disabled() {
        let log = ActivityLog::from_config(&LoggingConfig::default());
        assert!(!log.is_enabled());
    }

    #[test]
    fn file_failure_carries_stage_and_kind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activity.jsonl");
        let mut log = ActivityLog::open(path.clone(), &LoggingConfig::default());

        log.record(&ActivityEvent::FileFailed {
            index: 7,
            path: "files/file7.test".to_string(),
            stage: FailureStage::Open,
            kind: FailureKind::NotFound,
            message: "No such file or directory (os error 2)".to_string(),
        });
        log.flush();

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["event"], "file_error");
        assert_eq!(lines[0]["severity"], "warning");
        assert_eq!(lines[0]["index"], 7);
        assert_eq!(lines[0]["stage"], "open");
        assert_eq!(lines[0]["error_kind"], "not_found");
        assert_eq!(lines[0]["ok"], false);
    }

    #[test]
    fn run_start_includes_policy_and_hash() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activity.jsonl");
        let mut log =
            ActivityLog::open(path.clone(), &LoggingConfig::default()).with_config_hash("abc123");

        log.record(&ActivityEvent::RunStarted {
            directory: "files".to_string(),
            file_count: 100,
            policy: MissingFilePolicy::Skip,
        });
        log.flush();

        let lines = read_lines(&path);
        let details = lines[0]["details"].as_str().unwrap();
        assert!(details.contains("missing_file=skip"), "{details}");
        assert!(details.contains("config_hash=abc123"), "{details}");
        assert_eq!(lines[0]["file_count"], 100);
    }

    #[test]
    fn completed_run_with_failures_is_a_warning() {
        let entry = ActivityEvent::RunCompleted {
            files: 100,
            failed: 1,
            total_bytes: 496,
            duration_ms: 3,
        }
        .to_entry();
        assert_eq!(entry.severity, Severity::Warning);
        assert_eq!(entry.ok, Some(false));
        assert_eq!(entry.total_bytes, Some(496));
    }
}
