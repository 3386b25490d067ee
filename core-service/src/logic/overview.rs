//! Overview Data - KPIs, Nodes, System Health
//!
//! Read-only data shown on the dashboard. The built-in sample values are
//! displayed until the backend answers; the dashboard never mutates them.

use serde::{Deserialize, Serialize};

/// Aggregate metrics tile row
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Kpis {
    #[serde(default, alias = "totalNodes")]
    pub total_nodes: u64,
    #[serde(default, alias = "activeNodes")]
    pub active_nodes: u64,
    #[serde(default, alias = "totalDataPoints", alias = "data_points")]
    pub total_data_points: u64,
    #[serde(default, alias = "unlearningRequests")]
    pub unlearning_requests: u64,
    #[serde(default, alias = "modelAccuracy")]
    pub model_accuracy: f64,
    #[serde(default, alias = "privacyScore")]
    pub privacy_score: f64,
}

impl Kpis {
    pub fn sample() -> Self {
        Self {
            total_nodes: 5,
            active_nodes: 4,
            total_data_points: 69_820,
            unlearning_requests: 23,
            model_accuracy: 94.2,
            privacy_score: 98.5,
        }
    }
}

/// A federated client node
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, alias = "data_points")]
    pub data_points: u64,
    #[serde(default)]
    pub unlearned: u64,
    #[serde(default)]
    pub region: String,
    /// Fraction 0..1
    #[serde(default, alias = "duplicate_ratio")]
    pub duplicate_ratio: f64,
}

impl Node {
    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case("active")
    }

    pub fn duplicate_pct(&self) -> u32 {
        (self.duplicate_ratio * 100.0).round().max(0.0) as u32
    }
}

/// Health gauges (latency, sync, privacy compliance)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HealthGauges {
    #[serde(default)]
    pub latency_ms: f64,
    #[serde(default)]
    pub sync_pct: f64,
    #[serde(default)]
    pub privacy_pct: f64,
}

impl HealthGauges {
    pub fn sample() -> Self {
        Self {
            latency_ms: 42.0,
            sync_pct: 92.0,
            privacy_pct: 98.0,
        }
    }
}

/// The nodes endpoint answers with a bare list or a wrapped one
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum NodesPayload {
    List(Vec<Node>),
    Items { items: Vec<Node> },
    Nodes { nodes: Vec<Node> },
}

impl NodesPayload {
    pub fn into_nodes(self) -> Vec<Node> {
        match self {
            Self::List(nodes) | Self::Items { items: nodes } | Self::Nodes { nodes } => nodes,
        }
    }
}

/// Sample nodes shown before the backend is reachable
pub fn sample_nodes() -> Vec<Node> {
    let node = |id, name: &str, status: &str, data_points, region: &str, duplicate_ratio| Node {
        id,
        name: name.to_string(),
        status: status.to_string(),
        data_points,
        unlearned: 0,
        region: region.to_string(),
        duplicate_ratio,
    };

    vec![
        node(1, "Node Alpha", "active", 15_420, "US-East", 0.08),
        node(2, "Node Beta", "active", 12_850, "EU-West", 0.12),
        node(3, "Node Gamma", "syncing", 18_200, "Asia-Pacific", 0.05),
        node(4, "Node Delta", "active", 9_750, "US-West", 0.10),
        node(5, "Node Epsilon", "active", 13_600, "EU-North", 0.07),
    ]
}
