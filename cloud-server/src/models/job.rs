//! Job model

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::RunRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Running,
    Complete,
}

#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub id: Uuid,
    pub dataset: String,
    pub records: u64,
    pub config: RunRequest,
    pub status: JobStatus,
    /// 0..=100
    pub progress: u8,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub result: Option<JobResult>,
}

impl Job {
    pub fn new(dataset: String, records: u64, config: RunRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            dataset,
            records,
            config,
            status: JobStatus::Running,
            progress: 0,
            created_at: Utc::now(),
            finished_at: None,
            result: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == JobStatus::Complete
    }
}

/// Before/after counts of a finished job
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub before_records: u64,
    pub after_records: u64,
    pub removed: u64,
    pub reduction_pct: f64,
    pub removed_exact: u64,
    pub removed_fuzzy: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SamplePair {
    pub i_text: String,
    pub j_text: String,
    pub similarity: f64,
}

/// Toy model quality derived from the run configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobMetrics {
    pub model_accuracy: f64,
    pub privacy_score: f64,
    /// Injected duplicate fraction per node, in region order
    pub node_duplicate_ratio: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct JobResult {
    pub summary: RunSummary,
    pub metrics: JobMetrics,
    pub sample_pairs: Vec<SamplePair>,
    /// Cleaned artifact served by the download endpoint
    pub csv: String,
}

/// `GET /api/results` payload
#[derive(Debug, Serialize)]
pub struct ResultsResponse {
    pub job_id: Uuid,
    pub dataset_name: String,
    pub rows: u64,
    pub duplicates_removed: u64,
    pub duplicate_rate_before: f64,
    pub duplicate_rate_after: f64,
    pub summary: RunSummary,
    pub sample_pairs: Vec<SamplePair>,
    pub download: String,
}
