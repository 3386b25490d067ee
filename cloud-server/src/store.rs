//! In-memory application store
//!
//! Holds the active dataset and recent jobs. Finished jobs beyond
//! `MAX_FINISHED_JOBS` are evicted oldest first. Nothing is persisted.

use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::{
    ActiveDataset, Job, JobResult, JobStatus, Kpis, Node, ACTIVE_REGIONS, REGIONS,
};

/// Finished jobs kept for results and downloads
pub const MAX_FINISHED_JOBS: usize = 32;

/// Shown until a job has finished
const DEFAULT_MODEL_ACCURACY: f64 = 94.2;
const DEFAULT_PRIVACY_SCORE: f64 = 98.5;

#[derive(Default)]
struct StoreInner {
    dataset: ActiveDataset,
    jobs: HashMap<Uuid, Job>,
    /// Runs started since startup, evicted ones included
    requests: u64,
    /// Records removed since startup, evicted jobs included
    removed_total: u64,
}

impl StoreInner {
    fn latest_finished(&self) -> Option<&Job> {
        self.jobs
            .values()
            .filter(|j| j.is_complete())
            .max_by_key(|j| j.finished_at)
    }

    fn evict_finished(&mut self, limit: usize) {
        let mut finished: Vec<_> = self
            .jobs
            .values()
            .filter(|j| j.is_complete())
            .map(|j| (j.finished_at, j.id))
            .collect();
        if finished.len() <= limit {
            return;
        }

        finished.sort();
        let excess = finished.len() - limit;
        for (_, id) in finished.into_iter().take(excess) {
            self.jobs.remove(&id);
            tracing::debug!(job_id = %id, "Evicted finished job");
        }
    }
}

pub struct AppStore {
    inner: RwLock<StoreInner>,
    max_finished: usize,
}

impl Default for AppStore {
    fn default() -> Self {
        Self::with_job_limit(MAX_FINISHED_JOBS)
    }
}

impl AppStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_job_limit(max_finished: usize) -> Self {
        Self {
            inner: RwLock::new(StoreInner::default()),
            max_finished: max_finished.max(1),
        }
    }

    // ========================================================================
    // DATASET
    // ========================================================================

    pub fn dataset(&self) -> ActiveDataset {
        self.inner.read().dataset.clone()
    }

    pub fn set_dataset(&self, dataset: ActiveDataset) {
        tracing::info!("Active dataset: {} ({} records)", dataset.name, dataset.records);
        self.inner.write().dataset = dataset;
    }

    // ========================================================================
    // JOBS
    // ========================================================================

    pub fn insert_job(&self, job: Job) -> Uuid {
        let id = job.id;
        let mut inner = self.inner.write();
        inner.requests += 1;
        inner.jobs.insert(id, job);
        id
    }

    pub fn job(&self, id: &Uuid) -> Option<Job> {
        self.inner.read().jobs.get(id).cloned()
    }

    /// Current progress, `None` for unknown jobs
    pub fn progress(&self, id: &Uuid) -> Option<u8> {
        self.inner.read().jobs.get(id).map(|j| j.progress)
    }

    pub fn set_progress(&self, id: &Uuid, pct: u8) {
        if let Some(job) = self.inner.write().jobs.get_mut(id) {
            job.progress = pct.min(100);
        }
    }

    pub fn finish_job(&self, id: &Uuid, result: JobResult) {
        let mut inner = self.inner.write();
        let removed = result.summary.removed;

        let Some(job) = inner.jobs.get_mut(id) else {
            return;
        };
        job.result = Some(result);
        job.status = JobStatus::Complete;
        job.progress = 100;
        job.finished_at = Some(Utc::now());

        inner.removed_total += removed;
        inner.evict_finished(self.max_finished);
    }

    // ========================================================================
    // OVERVIEW
    // ========================================================================

    pub fn kpis(&self) -> Kpis {
        let inner = self.inner.read();
        let records = inner.dataset.records;

        let metrics = inner
            .latest_finished()
            .and_then(|j| j.result.as_ref())
            .map(|r| &r.metrics);
        let (model_accuracy, privacy_score) = match metrics {
            _ if records == 0 => (0.0, 0.0),
            Some(m) => (m.model_accuracy, m.privacy_score),
            None => (DEFAULT_MODEL_ACCURACY, DEFAULT_PRIVACY_SCORE),
        };

        Kpis {
            total_nodes: REGIONS.len() as u64,
            active_nodes: ACTIVE_REGIONS.len() as u64,
            total_data_points: records,
            unlearning_requests: inner.requests,
            model_accuracy,
            privacy_score,
        }
    }

    /// One node per region. Records and removals are split evenly; the
    /// duplicate ratio is the latest finished job's, per node.
    pub fn nodes(&self) -> Vec<Node> {
        let inner = self.inner.read();
        let count = REGIONS.len() as u64;
        let removed = inner.removed_total;

        let ratios = inner
            .latest_finished()
            .and_then(|j| j.result.as_ref())
            .map(|r| r.metrics.node_duplicate_ratio.as_slice())
            .unwrap_or(&[]);

        REGIONS
            .iter()
            .enumerate()
            .map(|(i, region)| {
                let i = i as u64;
                Node {
                    id: i + 1,
                    name: format!("{} Node", region),
                    status: if ACTIVE_REGIONS.contains(region) { "active" } else { "syncing" },
                    data_points: share(inner.dataset.records, count, i),
                    unlearned: share(removed, count, i),
                    region: region.to_string(),
                    duplicate_ratio: ratios.get(i as usize).copied().unwrap_or(0.0),
                }
            })
            .collect()
    }
}

/// Even split of `total` over `parts`, remainder to the first parts
fn share(total: u64, parts: u64, index: u64) -> u64 {
    total / parts + u64::from(index < total % parts)
}
