//! Dashboard overview models

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Kpis {
    pub total_nodes: u64,
    pub active_nodes: u64,
    pub total_data_points: u64,
    pub unlearning_requests: u64,
    pub model_accuracy: f64,
    pub privacy_score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Node {
    pub id: u64,
    pub name: String,
    pub status: &'static str,
    pub data_points: u64,
    pub unlearned: u64,
    pub region: String,
    /// Fraction 0..1
    pub duplicate_ratio: f64,
}

#[derive(Debug, Serialize)]
pub struct NodeList {
    pub items: Vec<Node>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthGauges {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: i64,
    pub latency_ms: f64,
    pub sync_pct: f64,
    pub privacy_pct: f64,
}

/// Answer of dataset select / upload
#[derive(Debug, Serialize)]
pub struct DatasetChanged {
    pub ok: bool,
    pub dataset: String,
    pub kpis: Kpis,
    pub nodes: Vec<Node>,
}
