//! Simulated unlearning job
//!
//! No real deduplication happens. The job walks through fixed progress
//! stages and derives a plausible summary from the dataset size and the
//! attack parameters.

use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::models::{
    AttackParams, GdprParams, Job, JobMetrics, JobResult, RunSummary, SamplePair, REGIONS,
    SUBJECT_ID_COLUMN,
};
use crate::store::AppStore;

/// Progress values reported while a job runs
pub const STAGES: [u8; 7] = [5, 10, 25, 40, 55, 75, 100];

/// Share of removed duplicates that were exact copies
const EXACT_SHARE: f64 = 0.8;

/// Rows written to the downloadable artifact
const ARTIFACT_ROWS: u64 = 200;

/// Accuracy of a clean model, and the floor it degrades to
const CLEAN_ACCURACY: f64 = 93.0;
const MIN_ACCURACY: f64 = 70.0;
/// Accuracy points lost per unit of average duplicate fraction
const DUPLICATION_PENALTY: f64 = 12.0;

const BASE_PRIVACY: f64 = 90.0;
const MAX_PRIVACY: f64 = 99.9;

pub fn spawn(store: Arc<AppStore>, job_id: Uuid, step: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        for (i, pct) in STAGES.iter().copied().enumerate() {
            if i > 0 {
                tokio::time::sleep(step).await;
            }

            if pct < 100 {
                store.set_progress(&job_id, pct);
                continue;
            }

            match store.job(&job_id) {
                Some(job) => {
                    let result = simulate(&job);
                    tracing::info!(
                        job_id = %job_id,
                        removed = result.summary.removed,
                        "Job complete"
                    );
                    store.finish_job(&job_id, result);
                }
                None => tracing::warn!(job_id = %job_id, "Job vanished before completion"),
            }
        }
    })
}

/// Derive the result of a job from its configuration
pub fn simulate(job: &Job) -> JobResult {
    let attack = &job.config.attack;

    let injected = if attack.injects_duplicates() {
        let ratio = f64::from(attack.duplicate_ratio) / 100.0;
        let clients = f64::from(attack.clients_affected) / 100.0;
        (job.records as f64 * ratio * clients).round() as u64
    } else {
        0
    };

    let before_records = job.records + injected;
    let removed = injected;
    let after_records = before_records - removed;
    let removed_exact = (removed as f64 * EXACT_SHARE).round() as u64;

    let reduction_pct = if before_records > 0 {
        (removed as f64 / before_records as f64 * 10_000.0).round() / 100.0
    } else {
        0.0
    };

    let summary = RunSummary {
        before_records,
        after_records,
        removed,
        reduction_pct,
        removed_exact,
        removed_fuzzy: removed - removed_exact,
    };

    let node_duplicate_ratio = node_duplicate_ratio(attack);
    let metrics = JobMetrics {
        model_accuracy: model_accuracy(&node_duplicate_ratio),
        privacy_score: privacy_score(&job.config.gdpr),
        node_duplicate_ratio,
    };

    JobResult {
        sample_pairs: sample_pairs(removed),
        csv: artifact(&job.dataset, after_records),
        summary,
        metrics,
    }
}

/// Number of nodes receiving injected duplicates
pub fn affected_nodes(attack: &AttackParams) -> usize {
    if !attack.injects_duplicates() || attack.duplicate_ratio == 0 {
        return 0;
    }

    let nodes = REGIONS.len();
    let share = f64::from(attack.clients_affected) / 100.0;
    ((nodes as f64 * share).round() as usize).clamp(1, nodes)
}

/// Affected nodes come first in region order; the rest stay clean
fn node_duplicate_ratio(attack: &AttackParams) -> Vec<f64> {
    let affected = affected_nodes(attack);
    let ratio = round_to(f64::from(attack.duplicate_ratio) / 100.0, 3);

    (0..REGIONS.len())
        .map(|i| if i < affected { ratio } else { 0.0 })
        .collect()
}

/// Accuracy falls linearly with the average duplicate fraction
pub fn model_accuracy(node_duplicate_ratio: &[f64]) -> f64 {
    let avg = if node_duplicate_ratio.is_empty() {
        0.0
    } else {
        node_duplicate_ratio.iter().sum::<f64>() / node_duplicate_ratio.len() as f64
    };

    round_to((CLEAN_ACCURACY - DUPLICATION_PENALTY * avg).max(MIN_ACCURACY), 1)
}

/// DP with a small epsilon, audit logging and hard deletes raise the score
pub fn privacy_score(gdpr: &GdprParams) -> f64 {
    let mut score = BASE_PRIVACY;
    if gdpr.dp_enabled {
        score += (5.0 - (gdpr.epsilon / 2.0).min(5.0)).max(0.0);
    }
    if gdpr.audit_log {
        score += 2.0;
    }
    if gdpr.unlearning_mode == "hard_delete" {
        score += 2.0;
    }

    round_to(score, 1).min(MAX_PRIVACY)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn sample_pairs(removed: u64) -> Vec<SamplePair> {
    if removed == 0 {
        return Vec::new();
    }

    [
        ("Ryan Walsh", "Ryan Walsh", 100.0),
        ("Grace Alesci", "Grace Alesci-Pettitt", 92.3),
        ("Anwar Miesso", "Anwar Meisso", 91.7),
    ]
    .iter()
    .take(removed.min(3) as usize)
    .map(|(i, j, similarity)| SamplePair {
        i_text: i.to_string(),
        j_text: j.to_string(),
        similarity: *similarity,
    })
    .collect()
}

/// Cleaned dataset preview as CSV
fn artifact(dataset: &str, rows: u64) -> String {
    let mut csv = format!("{},text,region,label\n", SUBJECT_ID_COLUMN);
    for i in 0..rows.min(ARTIFACT_ROWS) {
        let region = REGIONS[(i as usize) % REGIONS.len()];
        let _ = writeln!(csv, "subject-{:05},{} record {},{},{}", i, dataset, i, region, i % 10);
    }
    csv
}
