//! Property-based tests for tally invariants.
//!
//! Each case lays out a random file set (some files absent, some empty) in a
//! scratch directory and checks that the printed total is the sum of the
//! per-file contributions and that repeated runs agree.

use std::fs;
use std::path::Path;

use proptest::prelude::*;

use super::{FILE_ERROR_TEXT, FileOutcome, MissingFilePolicy, Tally};
use crate::counter::PathTemplate;
use crate::logger::activity::ActivityLog;

// ──────────────────── strategies ────────────────────

/// `None` = file absent, `Some(n)` = file of `n` bytes.
fn arb_file_set() -> impl Strategy<Value = Vec<Option<usize>>> {
    prop::collection::vec(prop::option::weighted(0.8, 0usize..2048), 0..24)
}

fn arb_policy() -> impl Strategy<Value = MissingFilePolicy> {
    prop_oneof![Just(MissingFilePolicy::Sentinel), Just(MissingFilePolicy::Skip)]
}

// ──────────────────── helpers ────────────────────

fn lay_out(dir: &Path, set: &[Option<usize>]) {
    for (i, entry) in set.iter().enumerate() {
        if let Some(size) = entry {
            fs::write(dir.join(format!("file{i}.test")), vec![0xA5; *size]).unwrap();
        }
    }
}

fn run(dir: &Path, count: usize, policy: MissingFilePolicy) -> (String, super::TallyReport) {
    let tally = Tally::new(PathTemplate::new(dir, "file", ".test", count), policy);
    let mut out = Vec::new();
    let report = tally.run(&mut out, &mut ActivityLog::disabled()).unwrap();
    (String::from_utf8(out).unwrap(), report)
}

// ──────────────────── properties ────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn total_is_sum_of_contributions(set in arb_file_set(), policy in arb_policy()) {
        let dir = tempfile::tempdir().unwrap();
        lay_out(dir.path(), &set);

        let (out, report) = run(dir.path(), set.len(), policy);

        let expected: u64 = set
            .iter()
            .map(|e| e.map_or(policy.contribution(), |n| n as u64))
            .sum();
        prop_assert_eq!(report.total_bytes(), expected);

        let summed: u64 = report.files().iter().map(|f| f.contribution).sum();
        prop_assert_eq!(summed, report.total_bytes());

        let missing = set.iter().filter(|e| e.is_none()).count();
        prop_assert_eq!(report.failed_files(), missing);
        prop_assert_eq!(out.matches(FILE_ERROR_TEXT).count(), missing);
        let expected_tail = format!("Total file bytes: {expected}\n");
        prop_assert!(out.ends_with(&expected_tail));
    }

    #[test]
    fn counted_files_report_true_size(set in arb_file_set()) {
        let dir = tempfile::tempdir().unwrap();
        lay_out(dir.path(), &set);

        let (_, report) = run(dir.path(), set.len(), MissingFilePolicy::Skip);
        for (row, entry) in report.files().iter().zip(&set) {
            match (&row.outcome, entry) {
                (FileOutcome::Counted(n), Some(size)) => {
                    prop_assert_eq!(*n, *size as u64);
                }
                (FileOutcome::Failed(_), None) => {}
                (outcome, entry) => {
                    prop_assert!(false, "row {} mismatched: {:?} vs {:?}", row.index, outcome, entry);
                }
            }
        }
    }

    #[test]
    fn repeated_runs_are_identical(set in arb_file_set(), policy in arb_policy()) {
        let dir = tempfile::tempdir().unwrap();
        lay_out(dir.path(), &set);

        let (first_out, first) = run(dir.path(), set.len(), policy);
        let (second_out, second) = run(dir.path(), set.len(), policy);

        prop_assert_eq!(first_out, second_out);
        prop_assert_eq!(first.files(), second.files());
    }
}
