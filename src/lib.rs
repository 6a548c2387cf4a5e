#![forbid(unsafe_code)]

//! File Byte Counter (fbc), a disk-read test program.
//!
//! Reads a numbered set of files (`files/file0.test` … `files/file99.test` by
//! default) in binary mode, sums their sizes, and prints
//! `Total file bytes: <N>`. Unreadable files print `File error` and are folded
//! into the total according to a [`tally::MissingFilePolicy`].
//!
//! # Library usage
//!
//! ```rust,no_run
//! use file_byte_counter::prelude::*;
//!
//! let config = Config::load(None)?;
//! let tally = Tally::new(
//!     PathTemplate::from_input(&config.input),
//!     config.input.missing_file,
//! );
//! let report = tally.run(&mut std::io::stdout(), &mut ActivityLog::disabled())?;
//! assert!(report.total_bytes() >= report.counted_bytes());
//! # Ok::<(), FbcError>(())
//! ```

pub mod prelude;

pub mod core;
pub mod counter;
pub mod fixtures;
pub mod logger;
pub mod tally;
