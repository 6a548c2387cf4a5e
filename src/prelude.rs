//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use file_byte_counter::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{FbcError, Result};

// Counting
pub use crate::counter::{FailureKind, FailureStage, PathTemplate, ReadFailure, count_file_bytes};
pub use crate::tally::{FileOutcome, FileTally, MissingFilePolicy, Tally, TallyReport};

// Fixtures
pub use crate::fixtures::{FixtureReport, FixtureWriter};

// Logging
pub use crate::logger::activity::{ActivityEvent, ActivityLog};
