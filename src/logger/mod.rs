//! Activity logging: typed events written to an append-only JSONL file.

pub mod activity;
pub mod jsonl;
