//! Tally driver: walk the numbered file set, count each file, print the total.
//!
//! Output contract (stdout by default, any `Write` sink in tests):
//! - every file that cannot be read emits the bare text `File error`, with no
//!   newline and no path;
//! - after the last file, `Total file bytes: <N>` and a line terminator.
//!
//! Per-file failures never abort the walk. How a failure contributes to the
//! total is set by [`MissingFilePolicy`].

#![allow(missing_docs)]

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::core::errors::{FbcError, Result};
use crate::counter::{PathTemplate, ReadFailure, count_file_bytes};
use crate::logger::activity::{ActivityEvent, ActivityLog};

#[cfg(test)]
mod test_properties;

/// Text emitted for every file that could not be read.
pub const FILE_ERROR_TEXT: &str = "File error";

/// Bytes credited to an unreadable file under [`MissingFilePolicy::Sentinel`].
///
/// Indistinguishable in the printed total from a genuine 1-byte file; the
/// [`TallyReport`] keeps the two apart.
pub const LEGACY_SENTINEL_BYTES: u64 = 1;

/// What an unreadable file adds to the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingFilePolicy {
    /// Add [`LEGACY_SENTINEL_BYTES`] (historical behavior).
    #[default]
    Sentinel,
    /// Add nothing.
    Skip,
}

impl MissingFilePolicy {
    pub const fn contribution(self) -> u64 {
        match self {
            Self::Sentinel => LEGACY_SENTINEL_BYTES,
            Self::Skip => 0,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sentinel => "sentinel",
            Self::Skip => "skip",
        }
    }
}

impl fmt::Display for MissingFilePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MissingFilePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sentinel" => Ok(Self::Sentinel),
            "skip" => Ok(Self::Skip),
            other => Err(format!(
                "unknown missing-file policy {other:?} (expected \"sentinel\" or \"skip\")"
            )),
        }
    }
}

/// Result of reading one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Counted(u64),
    Failed(ReadFailure),
}

impl FileOutcome {
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// One row of the tally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTally {
    pub index: usize,
    pub path: PathBuf,
    pub outcome: FileOutcome,
    /// Amount actually added to the running total for this file.
    pub contribution: u64,
}

/// Everything a tally run observed.
#[derive(Debug, Clone)]
pub struct TallyReport {
    files: Vec<FileTally>,
    total_bytes: u64,
    elapsed: Duration,
}

impl TallyReport {
    /// The printed total, sentinel contributions included.
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Bytes actually read from files that opened and read cleanly.
    pub fn counted_bytes(&self) -> u64 {
        self.files
            .iter()
            .filter_map(|f| match f.outcome {
                FileOutcome::Counted(n) => Some(n),
                FileOutcome::Failed(_) => None,
            })
            .sum()
    }

    pub fn failed_files(&self) -> usize {
        self.files.iter().filter(|f| f.outcome.is_failed()).count()
    }

    pub fn files(&self) -> &[FileTally] {
        &self.files
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

/// Sequential driver over a [`PathTemplate`].
#[derive(Debug, Clone)]
pub struct Tally {
    template: PathTemplate,
    policy: MissingFilePolicy,
}

impl Tally {
    pub fn new(template: PathTemplate, policy: MissingFilePolicy) -> Self {
        Self { template, policy }
    }

    pub fn template(&self) -> &PathTemplate {
        &self.template
    }

    pub fn policy(&self) -> MissingFilePolicy {
        self.policy
    }

    /// Count every file in order, writing the report text to `out`.
    ///
    /// Only a failure to write `out` is returned as an error; unreadable
    /// files are part of the report.
    pub fn run<W: Write>(&self, out: &mut W, log: &mut ActivityLog) -> Result<TallyReport> {
        let started = Instant::now();
        log.record(&ActivityEvent::RunStarted {
            directory: display(self.template.directory()),
            file_count: self.template.len(),
            policy: self.policy,
        });

        let mut files = Vec::with_capacity(self.template.len());
        let mut total: u64 = 0;

        for (index, path) in self.template.paths() {
            let outcome = match count_file_bytes(&path) {
                Ok(bytes) => {
                    log.record(&ActivityEvent::FileCounted {
                        index,
                        path: display(&path),
                        bytes,
                    });
                    FileOutcome::Counted(bytes)
                }
                Err(failure) => {
                    out.write_all(FILE_ERROR_TEXT.as_bytes())
                        .map_err(|source| FbcError::Output { source })?;
                    log.record(&ActivityEvent::FileFailed {
                        index,
                        path: display(&path),
                        stage: failure.stage,
                        kind: failure.kind,
                        message: failure.message.clone(),
                    });
                    FileOutcome::Failed(failure)
                }
            };

            let contribution = match &outcome {
                FileOutcome::Counted(bytes) => *bytes,
                FileOutcome::Failed(_) => self.policy.contribution(),
            };
            total = total.saturating_add(contribution);
            files.push(FileTally {
                index,
                path,
                outcome,
                contribution,
            });
        }

        writeln!(out, "Total file bytes: {total}").map_err(|source| FbcError::Output { source })?;
        out.flush().map_err(|source| FbcError::Output { source })?;

        let report = TallyReport {
            files,
            total_bytes: total,
            elapsed: started.elapsed(),
        };
        log.record(&ActivityEvent::RunCompleted {
            files: report.files.len(),
            failed: report.failed_files(),
            total_bytes: report.total_bytes,
            duration_ms: u64::try_from(report.elapsed.as_millis()).unwrap_or(u64::MAX),
        });
        Ok(report)
    }
}

fn display(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
