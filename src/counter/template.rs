//! Numbered file-set naming: `<directory>/<prefix><index><suffix>`.

use std::path::{Path, PathBuf};

use crate::core::config::InputConfig;

/// Default directory holding the numbered read set.
pub const DEFAULT_DIRECTORY: &str = "files";
/// Default filename prefix.
pub const DEFAULT_PREFIX: &str = "file";
/// Default filename suffix.
pub const DEFAULT_SUFFIX: &str = ".test";
/// Default number of files in the set.
pub const DEFAULT_FILE_COUNT: usize = 100;

/// Deterministic generator for the numbered file set.
///
/// Indices run `0..count` with no zero padding, so the default template yields
/// `files/file0.test` through `files/file99.test`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    directory: PathBuf,
    prefix: String,
    suffix: String,
    count: usize,
}

impl PathTemplate {
    pub fn new(
        directory: impl Into<PathBuf>,
        prefix: impl Into<String>,
        suffix: impl Into<String>,
        count: usize,
    ) -> Self {
        Self {
            directory: directory.into(),
            prefix: prefix.into(),
            suffix: suffix.into(),
            count,
        }
    }

    /// Build the template described by the `[input]` config section.
    pub fn from_input(input: &InputConfig) -> Self {
        Self::new(
            input.directory.clone(),
            input.file_prefix.clone(),
            input.file_suffix.clone(),
            input.file_count,
        )
    }

    /// Same naming, different number of files.
    #[must_use]
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Bare file name for one index, e.g. `file7.test`.
    pub fn file_name(&self, index: usize) -> String {
        format!("{}{index}{}", self.prefix, self.suffix)
    }

    /// Full path for one index, e.g. `files/file7.test`.
    pub fn path_for(&self, index: usize) -> PathBuf {
        self.directory.join(self.file_name(index))
    }

    /// Every `(index, path)` pair in ascending index order.
    pub fn paths(&self) -> impl Iterator<Item = (usize, PathBuf)> + '_ {
        (0..self.count).map(|index| (index, self.path_for(index)))
    }
}

impl Default for PathTemplate {
    fn default() -> Self {
        Self::new(
            DEFAULT_DIRECTORY,
            DEFAULT_PREFIX,
            DEFAULT_SUFFIX,
            DEFAULT_FILE_COUNT,
        )
    }
}
