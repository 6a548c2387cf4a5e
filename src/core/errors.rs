//! FBC-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, FbcError>;

/// Top-level error type for the file byte counter.
///
/// Per-file read failures are *not* represented here: they are ordinary
/// outcomes of a tally (see [`crate::counter::ReadFailure`]). These variants
/// cover everything that stops a command from running at all.
#[derive(Debug, Error)]
pub enum FbcError {
    #[error("[FBC-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[FBC-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[FBC-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[FBC-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[FBC-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[FBC-3003] failed to write report output: {source}")]
    Output {
        #[source]
        source: std::io::Error,
    },
}

impl FbcError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "FBC-1001",
            Self::MissingConfig { .. } => "FBC-1002",
            Self::ConfigParse { .. } => "FBC-1003",
            Self::Serialization { .. } => "FBC-2101",
            Self::Io { .. } => "FBC-3002",
            Self::Output { .. } => "FBC-3003",
        }
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for FbcError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for FbcError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

impl From<toml::ser::Error> for FbcError {
    fn from(value: toml::ser::Error) -> Self {
        Self::Serialization {
            context: "toml",
            details: value.to_string(),
        }
    }
}
