//! Usage-snapshot ingest.
//!
//! A usage snapshot is a JSON file of per-model usage rows for some
//! period, the already-extracted form of the data the ranking pages
//! publish. Scraping those pages is out of scope here; this module only
//! validates and normalizes what a snapshot claims.
//!
//! Design goals:
//! - **Strict schema** for required fields (clear errors + exit code 2)
//! - **Row-level validation** with row indices in messages
//! - **No hidden defaults**: a snapshot with no usable rows is an error

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// One model's usage over the snapshot period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRow {
    /// Model name as published by the ranking source.
    pub model: String,
    /// Provider slug, when the source distinguishes it.
    #[serde(default)]
    pub provider: Option<String>,
    pub requests: u64,
    #[serde(default)]
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

impl UsageRow {
    pub fn total_tokens(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// A full usage snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageSnapshot {
    pub asof_date: NaiveDate,
    /// Free-form period label ("day", "week", "month").
    #[serde(default)]
    pub period: Option<String>,
    pub rows: Vec<UsageRow>,
}

/// Read and validate a usage snapshot.
pub fn read_usage_snapshot(path: &Path) -> Result<UsageSnapshot, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::usage(format!(
            "Failed to open usage snapshot '{}': {e}",
            path.display()
        ))
    })?;

    let snapshot: UsageSnapshot = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        AppError::data(format!(
            "Failed to parse usage snapshot '{}': {e}",
            path.display()
        ))
    })?;

    validate_snapshot(&snapshot)?;
    Ok(snapshot)
}

fn validate_snapshot(snapshot: &UsageSnapshot) -> Result<(), AppError> {
    if snapshot.rows.is_empty() {
        return Err(AppError::data("Usage snapshot contains no rows."));
    }
    for (idx, row) in snapshot.rows.iter().enumerate() {
        if row.model.trim().is_empty() {
            return Err(AppError::data(format!(
                "Usage row {idx}: empty model name."
            )));
        }
        if row.requests == 0 {
            return Err(AppError::data(format!(
                "Usage row {idx} ('{}'): request count must be >= 1.",
                row.model
            )));
        }
    }
    Ok(())
}
