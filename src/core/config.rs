//! Configuration system: TOML file + env var overrides + defaults.
//!
//! Defaults reproduce the fixed behavior exactly (`files/file0.test` …
//! `files/file99.test`, sentinel contribution for unreadable files, no
//! activity log), so running with no config file changes nothing.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{FbcError, Result};
use crate::counter::template::{
    DEFAULT_DIRECTORY, DEFAULT_FILE_COUNT, DEFAULT_PREFIX, DEFAULT_SUFFIX,
};
use crate::tally::MissingFilePolicy;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "fbc.toml";

/// Upper bound on the size of a numbered file set.
pub const MAX_FILE_COUNT: usize = 1_000_000;

/// Full configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub input: InputConfig,
    pub fixtures: FixtureConfig,
    pub logging: LoggingConfig,
    /// Where this config was loaded from (not serialized).
    #[serde(skip)]
    pub config_file: PathBuf,
}

/// The numbered file set read by `count`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct InputConfig {
    pub directory: PathBuf,
    pub file_prefix: String,
    pub file_suffix: String,
    pub file_count: usize,
    /// Contribution of an unreadable file: `sentinel` (1 byte) or `skip` (0).
    pub missing_file: MissingFilePolicy,
}

/// Sizing for `generate`. Files are named by the `[input]` template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FixtureConfig {
    pub file_count: usize,
    pub file_size_bytes: u64,
}

/// JSONL activity log. No `jsonl_log` means logging is off.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jsonl_log: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_path: Option<PathBuf>,
    pub max_size_bytes: u64,
    pub max_rotated_files: u32,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_DIRECTORY),
            file_prefix: DEFAULT_PREFIX.to_string(),
            file_suffix: DEFAULT_SUFFIX.to_string(),
            file_count: DEFAULT_FILE_COUNT,
            missing_file: MissingFilePolicy::Sentinel,
        }
    }
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            file_count: DEFAULT_FILE_COUNT,
            file_size_bytes: 128 * 1024,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            jsonl_log: None,
            fallback_path: None,
            max_size_bytes: 16 * 1024 * 1024, // 16 MiB
            max_rotated_files: 3,
        }
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathBuf::from(DEFAULT_CONFIG_FILE)
    }

    /// Load, apply env overrides, and validate.
    ///
    /// Missing config file is not an error when loading from the default path.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let cfg = Self::load_unvalidated(path)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Like [`Config::load`] but leaves validation to the caller, so further
    /// overrides (CLI flags) can replace bad values first.
    pub fn load_unvalidated(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| FbcError::Io {
                path: path_buf.clone(),
                source,
            })?;
            let parsed: Self = toml::from_str(&raw)?;
            parsed
        } else if is_explicit_path {
            return Err(FbcError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.config_file = path_buf;
        cfg.apply_env_overrides_from(env_var)?;
        Ok(cfg)
    }

    /// Deterministic FNV-1a hash of the effective config, for the activity log.
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }

    /// Render the effective config as TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        // input
        if let Some(raw) = lookup("FBC_INPUT_DIRECTORY") {
            self.input.directory = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("FBC_INPUT_FILE_PREFIX") {
            self.input.file_prefix = raw;
        }
        if let Some(raw) = lookup("FBC_INPUT_FILE_SUFFIX") {
            self.input.file_suffix = raw;
        }
        if let Some(raw) = lookup("FBC_INPUT_FILE_COUNT") {
            self.input.file_count = parse_env_usize("FBC_INPUT_FILE_COUNT", &raw)?;
        }
        if let Some(raw) = lookup("FBC_INPUT_MISSING_FILE") {
            self.input.missing_file =
                raw.parse::<MissingFilePolicy>()
                    .map_err(|details| FbcError::ConfigParse {
                        context: "env",
                        details: format!("FBC_INPUT_MISSING_FILE: {details}"),
                    })?;
        }

        // fixtures
        if let Some(raw) = lookup("FBC_FIXTURES_FILE_COUNT") {
            self.fixtures.file_count = parse_env_usize("FBC_FIXTURES_FILE_COUNT", &raw)?;
        }
        if let Some(raw) = lookup("FBC_FIXTURES_FILE_SIZE_BYTES") {
            self.fixtures.file_size_bytes = parse_env_u64("FBC_FIXTURES_FILE_SIZE_BYTES", &raw)?;
        }

        // logging
        if let Some(raw) = lookup("FBC_LOGGING_JSONL_LOG") {
            self.logging.jsonl_log = Some(PathBuf::from(raw));
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.input.directory.as_os_str().is_empty() {
            return Err(FbcError::InvalidConfig {
                details: "input.directory must not be empty".to_string(),
            });
        }

        for (name, value) in [
            ("input.file_prefix", &self.input.file_prefix),
            ("input.file_suffix", &self.input.file_suffix),
        ] {
            if value.contains('/') || value.contains('\\') {
                return Err(FbcError::InvalidConfig {
                    details: format!("{name} must not contain a path separator, got {value:?}"),
                });
            }
        }

        if self.input.file_prefix.is_empty() && self.input.file_suffix.is_empty() {
            return Err(FbcError::InvalidConfig {
                details: "input.file_prefix and input.file_suffix cannot both be empty"
                    .to_string(),
            });
        }

        for (name, count) in [
            ("input.file_count", self.input.file_count),
            ("fixtures.file_count", self.fixtures.file_count),
        ] {
            if !(1..=MAX_FILE_COUNT).contains(&count) {
                return Err(FbcError::InvalidConfig {
                    details: format!("{name} must be in [1, {MAX_FILE_COUNT}], got {count}"),
                });
            }
        }

        if self.logging.max_size_bytes == 0 {
            return Err(FbcError::InvalidConfig {
                details: "logging.max_size_bytes must be > 0".to_string(),
            });
        }
        if self.logging.max_rotated_files == 0 {
            return Err(FbcError::InvalidConfig {
                details: "logging.max_rotated_files must be >= 1".to_string(),
            });
        }

        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn parse_env_usize(name: &str, raw: &str) -> Result<usize> {
    raw.trim()
        .parse::<usize>()
        .map_err(|error| FbcError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })
}

fn parse_env_u64(name: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|error| FbcError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })
}
