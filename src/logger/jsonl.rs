//! JSONL activity log: append-only line-delimited JSON.
//!
//! Each line is a self-contained JSON object, assembled in memory and written
//! with one `write_all` so a concurrent `tail -f` never sees half a line.
//!
//! The writer holds exactly one sink at a time and only ever moves down the
//! chain: primary file, fallback file (if configured), stderr with a
//! `[FBC-JSONL]` prefix, then discard. A tally never fails because of its log.

#![allow(missing_docs)]

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::config::LoggingConfig;
use crate::core::errors::{FbcError, Result};

/// Severity level for log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
}

/// Event types written to the activity log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    RunStart,
    FileCounted,
    FileError,
    RunComplete,
    FixtureWrite,
    FixturesComplete,
}

/// A single JSONL log entry. Only `ts`, `event` and `severity` are always present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// ISO 8601 UTC timestamp.
    pub ts: String,
    pub event: EventType,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Position of the file in the numbered set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    /// Bytes read or written for a single file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ok: Option<bool>,
    /// `open` or `read` for file errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl LogEntry {
    /// Create a new entry stamped with the current UTC time.
    pub fn new(event: EventType, severity: Severity) -> Self {
        Self {
            ts: format_utc_now(),
            event,
            severity,
            path: None,
            index: None,
            bytes: None,
            file_count: None,
            failed: None,
            total_bytes: None,
            duration_ms: None,
            ok: None,
            stage: None,
            error_kind: None,
            error_message: None,
            details: None,
        }
    }
}


const PREFIX: &str = "[FBC-JSONL]";

/// Configuration for the JSONL writer.
#[derive(Debug, Clone)]
pub struct JsonlConfig {
    pub path: PathBuf,
    pub fallback_path: Option<PathBuf>,
    /// A non-empty file is rotated before a line that would take it past this.
    pub max_size_bytes: u64,
    /// Number of rotated files to keep.
    pub max_rotated_files: u32,
}

impl JsonlConfig {
    /// Writer settings for a given primary path, tuned by the `[logging]` section.
    pub fn from_logging(path: PathBuf, logging: &LoggingConfig) -> Self {
        Self {
            path,
            fallback_path: logging.fallback_path.clone(),
            max_size_bytes: logging.max_size_bytes,
            max_rotated_files: logging.max_rotated_files,
        }
    }

    fn path_for(&self, role: Role) -> Option<&Path> {
        match role {
            Role::Primary => Some(&self.path),
            Role::Fallback => self.fallback_path.as_deref(),
        }
    }
}

/// Which configured file a file sink writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Primary,
    Fallback,
}

impl Role {
    const fn next(self) -> Option<Self> {
        match self {
            Self::Primary => Some(Self::Fallback),
            Self::Fallback => None,
        }
    }
}

enum Sink {
    File {
        out: BufWriter<File>,
        path: PathBuf,
        role: Role,
        /// Current length of the file on disk plus buffered bytes.
        size: u64,
    },
    Stderr,
    Discard,
}

/// Outcome of one attempt to place a line.
enum Attempt {
    Written,
    FileFailed(Role),
    StderrFailed,
}

/// Append-only JSONL writer with size rotation and a one-way fallback chain.
pub struct JsonlWriter {
    config: JsonlConfig,
    sink: Sink,
}

impl JsonlWriter {
    /// Open the primary log, or the first usable sink after it.
    pub fn open(config: JsonlConfig) -> Self {
        let sink = open_chain(&config, Role::Primary);
        Self { config, sink }
    }

    /// Write a single log entry as one JSONL line.
    pub fn write_entry(&mut self, entry: &LogEntry) {
        match serde_json::to_string(entry) {
            Ok(json) => self.write_line(&format!("{json}\n")),
            Err(e) => {
                let _ = writeln!(io::stderr(), "{PREFIX} serialize error: {e}");
            }
        }
    }

    /// Push buffered lines to disk and sync them. Called once per run.
    pub fn flush(&mut self) {
        if let Sink::File { out, .. } = &mut self.sink
            && out.flush().is_ok()
        {
            let _ = out.get_ref().sync_data();
        }
    }

    /// `primary`, `fallback`, `stderr` or `discard`.
    pub fn state(&self) -> &'static str {
        match &self.sink {
            Sink::File {
                role: Role::Primary,
                ..
            } => "primary",
            Sink::File {
                role: Role::Fallback,
                ..
            } => "fallback",
            Sink::Stderr => "stderr",
            Sink::Discard => "discard",
        }
    }

    /// Size of the current log file; 0 when not writing to a file.
    pub fn bytes_written(&self) -> u64 {
        match &self.sink {
            Sink::File { size, .. } => *size,
            Sink::Stderr | Sink::Discard => 0,
        }
    }

    fn write_line(&mut self, line: &str) {
        let len = line.len() as u64;
        if matches!(&self.sink, Sink::File { size, .. }
            if *size > 0 && size.saturating_add(len) > self.config.max_size_bytes)
        {
            self.rotate();
        }

        loop {
            let attempt = match &mut self.sink {
                Sink::File {
                    out, role, size, ..
                } => {
                    if out.write_all(line.as_bytes()).is_ok() {
                        *size += len;
                        Attempt::Written
                    } else {
                        Attempt::FileFailed(*role)
                    }
                }
                Sink::Stderr => {
                    if write!(io::stderr(), "{PREFIX} {line}").is_ok() {
                        Attempt::Written
                    } else {
                        Attempt::StderrFailed
                    }
                }
                Sink::Discard => Attempt::Written,
            };

            match attempt {
                Attempt::Written => return,
                Attempt::FileFailed(role) => {
                    self.sink = role
                        .next()
                        .map_or(Sink::Stderr, |next| open_chain(&self.config, next));
                }
                Attempt::StderrFailed => self.sink = Sink::Discard,
            }
        }
    }

    /// Shift `<log>.1..N` up by one, move the current file to `.1`, reopen.
    fn rotate(&mut self) {
        let Sink::File {
            mut out, path, role, ..
        } = std::mem::replace(&mut self.sink, Sink::Discard)
        else {
            return;
        };
        let _ = out.flush();
        drop(out);

        let keep = self.config.max_rotated_files;
        let _ = fs::remove_file(rotated_name(&path, keep));
        for i in (1..keep).rev() {
            let _ = fs::rename(rotated_name(&path, i), rotated_name(&path, i + 1));
        }
        let _ = fs::rename(&path, rotated_name(&path, 1));

        self.sink = match open_append(&path) {
            Ok((file, size)) => Sink::File {
                out: BufWriter::new(file),
                path,
                role,
                size,
            },
            Err(_) => role
                .next()
                .map_or(Sink::Stderr, |next| open_chain(&self.config, next)),
        };
    }
}

impl Drop for JsonlWriter {
    fn drop(&mut self) {
        self.flush();
    }
}

/// First sink that opens, starting at `start` and moving down the chain.
fn open_chain(config: &JsonlConfig, start: Role) -> Sink {
    let mut role = Some(start);
    while let Some(current) = role {
        if let Some(path) = config.path_for(current) {
            match open_append(path) {
                Ok((file, size)) => {
                    if current == Role::Fallback {
                        let _ = writeln!(
                            io::stderr(),
                            "{PREFIX} primary log unavailable, writing to {}",
                            path.display()
                        );
                    }
                    return Sink::File {
                        out: BufWriter::new(file),
                        path: path.to_path_buf(),
                        role: current,
                        size,
                    };
                }
                Err(e) => {
                    let _ = writeln!(io::stderr(), "{PREFIX} {e}");
                }
            }
        }
        role = current.next();
    }
    let _ = writeln!(io::stderr(), "{PREFIX} no writable log file, using stderr");
    Sink::Stderr
}

/// Open or create a file for appending. Returns `(File, current_size)`.
fn open_append(path: &Path) -> Result<(File, u64)> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| FbcError::io(parent, source))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| FbcError::io(path, source))?;
    let size = file.metadata().map_or(0, |m| m.len());
    Ok((file, size))
}

/// `foo.jsonl` → `foo.jsonl.3`.
fn rotated_name(base: &Path, index: u32) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{index}"));
    PathBuf::from(name)
}

fn format_utc_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
