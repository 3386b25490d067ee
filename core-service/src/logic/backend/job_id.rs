//! Job id extraction
//!
//! Backends disagree on the key name of the job id. The body is searched
//! with a fixed priority list, then the `x-job-id` header. When body and
//! header both carry an id the body wins.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Accepted body keys, highest priority first
pub const JOB_ID_KEYS: [&str; 6] = ["job_id", "jobId", "id", "job", "run_id", "runId"];

/// Opaque server-side job identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Returns `None` for blank ids
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        let trimmed = id.trim();
        (!trimmed.is_empty()).then(|| JobId(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Find the job id in a run response
pub fn extract_job_id(body: Option<&Value>, header: Option<&str>) -> Option<JobId> {
    body.and_then(from_body).or_else(|| header.and_then(JobId::new))
}

fn from_body(body: &Value) -> Option<JobId> {
    let object = body.as_object()?;

    JOB_ID_KEYS
        .iter()
        .filter_map(|key| object.get(*key))
        .find_map(|value| match value {
            // `{"job": {"id": ...}}`
            Value::Object(inner) => inner.get("id").and_then(scalar_id),
            other => scalar_id(other),
        })
}

fn scalar_id(value: &Value) -> Option<JobId> {
    match value {
        Value::String(s) => JobId::new(s.as_str()),
        Value::Number(n) => JobId::new(n.to_string()),
        _ => None,
    }
}
