//! Snapshot ingest and result export.

pub mod export;
pub mod usage;
