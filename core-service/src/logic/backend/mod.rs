//! Backend Module - Dashboard to Unlearning API Communication
//!
//! This module handles:
//! - The `Backend` seam the dashboard talks through (HTTP or mock)
//! - Dataset selection and upload
//! - Overview reads (KPIs, nodes, health)
//! - Run start, progress stream/poll, results
//! - Tolerant job id extraction

pub mod client;
pub mod error;
pub mod job_id;

pub use client::{ApiConfig, DashboardClient};
pub use error::ApiError;
pub use job_id::{extract_job_id, JobId, JOB_ID_KEYS};

use async_trait::async_trait;

use crate::logic::form::RunConfig;
use crate::logic::overview::{HealthGauges, Kpis, Node};
use crate::logic::progress::SseEvent;
use crate::logic::results::ResultsDocument;

/// Raw answer of the run endpoint, before job id extraction
#[derive(Debug, Clone, Default)]
pub struct RunResponse {
    /// Parsed JSON body, `None` when the body was empty or not JSON
    pub body: Option<serde_json::Value>,
    /// Value of the `x-job-id` header
    pub header_job_id: Option<String>,
}

impl RunResponse {
    pub fn job_id(&self) -> Option<JobId> {
        extract_job_id(self.body.as_ref(), self.header_job_id.as_deref())
    }
}

/// Server push channel for one job
#[async_trait]
pub trait ProgressStream: Send {
    /// Next event, `None` once the stream has ended or was closed
    async fn next_event(&mut self) -> Option<Result<SseEvent, ApiError>>;

    /// Close the connection. Idempotent.
    fn close(&mut self);
}

/// Everything the dashboard needs from the unlearning backend
#[async_trait]
pub trait Backend: Send + Sync {
    /// Base URL used to absolutize relative download links
    fn base_url(&self) -> &str;

    async fn list_datasets(&self) -> Result<Vec<String>, ApiError>;

    async fn select_dataset(&self, name: &str) -> Result<(), ApiError>;

    async fn upload_dataset(&self, file_name: &str, contents: Vec<u8>) -> Result<(), ApiError>;

    async fn kpis(&self) -> Result<Kpis, ApiError>;

    async fn nodes(&self) -> Result<Vec<Node>, ApiError>;

    async fn health(&self) -> Result<HealthGauges, ApiError>;

    async fn start_run(&self, config: &RunConfig) -> Result<RunResponse, ApiError>;

    async fn open_progress_stream(&self, job: &JobId) -> Result<Box<dyn ProgressStream>, ApiError>;

    /// Free-form progress text (fallback mode)
    async fn poll_progress(&self, job: &JobId) -> Result<String, ApiError>;

    async fn results(&self, job: &JobId) -> Result<ResultsDocument, ApiError>;
}
