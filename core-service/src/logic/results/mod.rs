//! Results Module - Final job results
//!
//! The results document is read defensively: every field is optional and
//! numbers may arrive as integers, floats or numeric strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::logic::backend::JobId;

/// Results endpoint payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultsDocument {
    #[serde(default)]
    pub summary: Value,
    #[serde(default, deserialize_with = "lenient_pairs")]
    pub sample_pairs: Vec<SamplePair>,
    #[serde(default)]
    pub download: Option<String>,
    #[serde(default)]
    pub dataset_name: Option<String>,
}

/// A detected duplicate pair
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SamplePair {
    #[serde(default, deserialize_with = "lenient_text")]
    pub i_text: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub j_text: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub similarity: f64,
}

/// Before/after counts of a finished run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub before_records: u64,
    pub after_records: u64,
    pub removed: u64,
    pub reduction_pct: f64,
    pub removed_exact: u64,
    pub removed_fuzzy: u64,
    /// Absolute download URL of the cleaned artifact
    pub download: Option<String>,
}

impl ResultSummary {
    /// Build the summary, filling derivable fields that are missing
    pub fn from_document(doc: &ResultsDocument, base_url: &str) -> Self {
        let summary = &doc.summary;

        let before_records = count(summary, "before_records").unwrap_or(0);
        let after_records = count(summary, "after_records").unwrap_or(0);
        let removed = count(summary, "removed")
            .unwrap_or_else(|| before_records.saturating_sub(after_records));
        let reduction_pct = number(summary, "reduction_pct").unwrap_or_else(|| {
            if before_records > 0 {
                removed as f64 / before_records as f64 * 100.0
            } else {
                0.0
            }
        });

        Self {
            before_records,
            after_records,
            removed,
            reduction_pct,
            removed_exact: count(summary, "removed_exact").unwrap_or(0),
            removed_fuzzy: count(summary, "removed_fuzzy").unwrap_or(0),
            download: doc
                .download
                .as_deref()
                .and_then(|path| absolute_download_url(base_url, path)),
        }
    }
}

/// Outcome of a completed run as kept on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub job_id: JobId,
    pub dataset: String,
    pub summary: ResultSummary,
    pub sample_pairs: Vec<SamplePair>,
    pub completed_at: DateTime<Utc>,
}

/// Prefix relative artifact paths with the backend base URL
pub fn absolute_download_url(base_url: &str, path: &str) -> Option<String> {
    let path = path.trim();
    if path.is_empty() {
        return None;
    }
    if path.starts_with("http://") || path.starts_with("https://") {
        return Some(path.to_string());
    }

    Some(format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    ))
}

fn as_number(value: &Value) -> Option<f64> {
    let value = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    value.filter(|v: &f64| v.is_finite())
}

fn number(summary: &Value, key: &str) -> Option<f64> {
    summary.get(key).and_then(as_number)
}

fn count(summary: &Value, key: &str) -> Option<u64> {
    number(summary, key).map(|v| v.max(0.0).round() as u64)
}

/// `null` or a non-array yields no pairs; malformed entries are skipped
fn lenient_pairs<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<SamplePair>, D::Error> {
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };

    Ok(items
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(as_number(&Value::deserialize(deserializer)?).unwrap_or(0.0))
}
