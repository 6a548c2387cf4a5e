//! Byte counter: whole-file binary reads with an explicit failure type.
//!
//! A file either yields its exact length in bytes or a [`ReadFailure`]. There is
//! no in-band sentinel; how a failure is folded into a total is decided by the
//! tally's [`MissingFilePolicy`](crate::tally::MissingFilePolicy).

#![allow(missing_docs)]
#![allow(clippy::cast_possible_truncation)]

pub mod template;

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use template::PathTemplate;

/// Which step of the read failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    Open,
    Read,
}

impl FailureStage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Read => "read",
        }
    }
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse cause of a read failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    NotFound,
    PermissionDenied,
    Other,
}

impl FailureKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::PermissionDenied => "permission_denied",
            Self::Other => "other",
        }
    }

    fn classify(error: &io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound,
            io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            _ => Self::Other,
        }
    }
}

/// A file that could not be counted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot {stage} {path}: {message}")]
pub struct ReadFailure {
    pub path: PathBuf,
    pub stage: FailureStage,
    pub kind: FailureKind,
    pub message: String,
}

impl ReadFailure {
    fn new(path: &Path, stage: FailureStage, error: &io::Error) -> Self {
        Self {
            path: path.to_path_buf(),
            stage,
            kind: FailureKind::classify(error),
            message: error.to_string(),
        }
    }
}

/// Read `path` in binary mode and return how many bytes it holds.
///
/// The contents are pulled into memory in one `read_to_end` call and dropped
/// once measured. The handle is closed on every return path.
pub fn count_file_bytes(path: &Path) -> Result<u64, ReadFailure> {
    let mut file =
        File::open(path).map_err(|e| ReadFailure::new(path, FailureStage::Open, &e))?;

    // Size hint only; the returned count is what was actually read.
    let hint = file.metadata().map_or(0, |m| m.len() as usize);
    let mut bytes = Vec::with_capacity(hint);
    file.read_to_end(&mut bytes)
        .map_err(|e| ReadFailure::new(path, FailureStage::Read, &e))?;

    Ok(bytes.len() as u64)
}
