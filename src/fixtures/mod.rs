//! Fixture writer: lays down the numbered file set that `count` reads.
//!
//! Every byte is a random character from the lowercase base-36 alphabet, so
//! fixtures are printable and incompressible enough to defeat filesystem
//! tricks without producing binary junk in a terminal.

#![allow(missing_docs)]
#![allow(clippy::cast_possible_truncation)]

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::time::{Duration, Instant};

use rand::Rng;

use crate::core::config::FixtureConfig;
use crate::core::errors::{FbcError, Result};
use crate::counter::PathTemplate;
use crate::logger::activity::{ActivityEvent, ActivityLog};

/// Characters fixture bytes are drawn from.
pub const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

const CHUNK_SIZE: usize = 64 * 1024;

/// Summary of one `generate` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureReport {
    pub files_written: usize,
    pub bytes_written: u64,
    pub elapsed: Duration,
}

/// Writes `template.len()` files of `file_size_bytes` each, overwriting.
#[derive(Debug, Clone)]
pub struct FixtureWriter {
    template: PathTemplate,
    file_size_bytes: u64,
}

impl FixtureWriter {
    pub fn new(template: PathTemplate, file_size_bytes: u64) -> Self {
        Self {
            template,
            file_size_bytes,
        }
    }

    /// Name files with `template`, size and count them per `[fixtures]`.
    pub fn from_config(template: PathTemplate, fixtures: &FixtureConfig) -> Self {
        Self::new(
            template.with_count(fixtures.file_count),
            fixtures.file_size_bytes,
        )
    }

    pub fn template(&self) -> &PathTemplate {
        &self.template
    }

    /// Write every fixture using the thread-local RNG.
    pub fn write_all(&self, log: &mut ActivityLog) -> Result<FixtureReport> {
        self.write_all_with(&mut rand::rng(), log)
    }

    /// Write every fixture drawing bytes from `rng`.
    pub fn write_all_with<R: Rng>(
        &self,
        rng: &mut R,
        log: &mut ActivityLog,
    ) -> Result<FixtureReport> {
        let started = Instant::now();
        let dir = self.template.directory();
        fs::create_dir_all(dir).map_err(|source| FbcError::io(dir, source))?;

        let mut chunk = vec![0u8; CHUNK_SIZE];
        let mut bytes_written: u64 = 0;

        for (index, path) in self.template.paths() {
            let file = File::create(&path).map_err(|source| FbcError::io(&path, source))?;
            let mut out = BufWriter::new(file);

            let mut remaining = self.file_size_bytes;
            while remaining > 0 {
                let n = remaining.min(CHUNK_SIZE as u64) as usize;
                fill_alphabet(rng, &mut chunk[..n]);
                out.write_all(&chunk[..n])
                    .map_err(|source| FbcError::io(&path, source))?;
                remaining -= n as u64;
            }
            out.flush().map_err(|source| FbcError::io(&path, source))?;

            bytes_written += self.file_size_bytes;
            log.record(&ActivityEvent::FixtureWritten {
                index,
                path: path.to_string_lossy().into_owned(),
                bytes: self.file_size_bytes,
            });
        }

        let report = FixtureReport {
            files_written: self.template.len(),
            bytes_written,
            elapsed: started.elapsed(),
        };
        log.record(&ActivityEvent::FixturesCompleted {
            files: report.files_written,
            total_bytes: report.bytes_written,
            duration_ms: u64::try_from(report.elapsed.as_millis()).unwrap_or(u64::MAX),
        });
        Ok(report)
    }
}

fn fill_alphabet<R: Rng>(rng: &mut R, buf: &mut [u8]) {
    for byte in buf {
        *byte = ALPHABET[rng.random_range(0..ALPHABET.len())];
    }
}
