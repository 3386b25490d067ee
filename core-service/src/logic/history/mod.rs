//! Run History Module - Capped local record of completed runs
//!
//! Keeps the last N completed runs across restarts.
//!
//! Flow:
//! 1. Load from disk (missing or corrupt file -> empty history)
//! 2. Insert newest entry first
//! 3. Drop the oldest entries beyond the cap
//! 4. Write back atomically (temp file + rename)


use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::HISTORY_LIMIT;
use crate::logic::results::RunOutcome;

/// One completed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub ts: DateTime<Utc>,
    pub job_id: String,
    pub dataset: String,
    pub before: u64,
    pub after: u64,
    pub removed: u64,
    pub reduction: f64,
    pub download_url: Option<String>,
}

impl From<&RunOutcome> for HistoryEntry {
    fn from(outcome: &RunOutcome) -> Self {
        Self {
            ts: outcome.completed_at,
            job_id: outcome.job_id.to_string(),
            dataset: outcome.dataset.clone(),
            before: outcome.summary.before_records,
            after: outcome.summary.after_records,
            removed: outcome.summary.removed,
            reduction: outcome.summary.reduction_pct,
            download_url: outcome.summary.download.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization Error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// File-backed run history, newest entry first
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
    limit: usize,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_limit(path, HISTORY_LIMIT)
    }

    pub fn with_limit(path: impl Into<PathBuf>, limit: usize) -> Self {
        Self {
            path: path.into(),
            limit: limit.max(1),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Load entries. Never fails: unreadable history starts empty.
    pub fn load(&self) -> Vec<HistoryEntry> {
        if !self.path.exists() {
            return Vec::new();
        }

        match self.read() {
            Ok(mut entries) => {
                entries.truncate(self.limit);
                entries
            }
            Err(e) => {
                log::warn!("Failed to load run history from {}: {}", self.path.display(), e);
                Vec::new()
            }
        }
    }

    /// Prepend an entry, enforce the cap and persist. Returns the new list.
    pub fn append(&self, entry: HistoryEntry) -> Result<Vec<HistoryEntry>, HistoryError> {
        let mut entries = self.load();
        entries.insert(0, entry);
        entries.truncate(self.limit);

        self.write(&entries)?;
        log::debug!("Run history saved ({} entries)", entries.len());
        Ok(entries)
    }

    pub fn clear(&self) -> Result<(), HistoryError> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }

    fn read(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        let data = fs::read(&self.path)?;
        Ok(serde_json::from_slice(&data)?)
    }

    fn write(&self, entries: &[HistoryEntry]) -> Result<(), HistoryError> {
        // Ensure directory exists
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_vec_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
