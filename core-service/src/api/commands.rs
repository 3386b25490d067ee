//! CLI Commands - Dashboard views for the terminal
//!
//! Every command prints either a text view or, with `--json`, the same data
//! as pretty JSON.

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::Path;

use unlearning_dashboard::logic::form::{target_classes, RunConfig};
use unlearning_dashboard::logic::history::HistoryEntry;
use unlearning_dashboard::logic::overview::{HealthGauges, Kpis, Node};
use unlearning_dashboard::logic::results::RunOutcome;
use unlearning_dashboard::{Dashboard, DashboardState, RunPhase};

// ============================================================================
// OUTPUT
// ============================================================================

pub struct Output {
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    fn emit<T: Serialize>(&self, value: &T, render: impl FnOnce(&T) -> String) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", render(value));
        }
        Ok(())
    }
}

/// KPIs, nodes and health in one document
#[derive(Debug, Serialize)]
pub struct OverviewView<'a> {
    pub kpis: &'a Kpis,
    pub nodes: &'a [Node],
    pub health: &'a HealthGauges,
}

#[derive(Debug, Serialize)]
struct DatasetsView {
    items: Vec<String>,
}

#[derive(Debug, Serialize)]
struct SelectView<'a> {
    dataset: &'a str,
    target_classes: Vec<String>,
}

// ============================================================================
// OVERVIEW COMMANDS
// ============================================================================

pub async fn show_kpis(dashboard: &mut Dashboard, out: &Output) -> anyhow::Result<()> {
    dashboard.refresh().await;
    out.emit(&dashboard.state().kpis, render_kpis)
}

pub async fn show_nodes(dashboard: &mut Dashboard, out: &Output) -> anyhow::Result<()> {
    dashboard.refresh().await;
    out.emit(&dashboard.state().nodes, |nodes| render_nodes(nodes))
}

pub async fn show_health(dashboard: &mut Dashboard, out: &Output) -> anyhow::Result<()> {
    dashboard.refresh().await;
    out.emit(&dashboard.state().health, render_health)
}

pub async fn show_overview(dashboard: &mut Dashboard, out: &Output) -> anyhow::Result<()> {
    dashboard.refresh().await;
    let state = dashboard.state();
    let view = OverviewView {
        kpis: &state.kpis,
        nodes: &state.nodes,
        health: &state.health,
    };

    out.emit(&view, |v| {
        format!(
            "{}\n\n{}\n\n{}",
            render_kpis(v.kpis),
            render_nodes(v.nodes),
            render_health(v.health)
        )
    })
}

fn render_kpis(kpis: &Kpis) -> String {
    format!(
        "Nodes            {} ({} active)\n\
         Data points      {}\n\
         Unlearning reqs  {}\n\
         Model accuracy   {:.1}%\n\
         Privacy score    {:.1}%",
        kpis.total_nodes,
        kpis.active_nodes,
        kpis.total_data_points,
        kpis.unlearning_requests,
        kpis.model_accuracy,
        kpis.privacy_score
    )
}

fn render_nodes(nodes: &[Node]) -> String {
    let mut lines = vec![format!(
        "{:<4} {:<16} {:<8} {:>8} {:>9} {:<10} {:>5}",
        "ID", "NAME", "STATUS", "POINTS", "UNLEARNED", "REGION", "DUP"
    )];

    for node in nodes {
        let status = if node.is_active() { "active" } else { node.status.as_str() };
        lines.push(format!(
            "{:<4} {:<16} {:<8} {:>8} {:>9} {:<10} {:>4}%",
            node.id,
            node.name,
            status,
            node.data_points,
            node.unlearned,
            node.region,
            node.duplicate_pct()
        ));
    }
    lines.join("\n")
}

fn render_health(health: &HealthGauges) -> String {
    format!(
        "Latency   {:.0} ms\nSync      {:.0}%\nPrivacy   {:.0}%",
        health.latency_ms, health.sync_pct, health.privacy_pct
    )
}

// ============================================================================
// DATASET COMMANDS
// ============================================================================

pub async fn list_datasets(dashboard: &Dashboard, out: &Output) -> anyhow::Result<()> {
    let items = dashboard.datasets().await?;
    out.emit(&DatasetsView { items }, |v| v.items.join("\n"))
}

pub async fn select_dataset(dashboard: &mut Dashboard, name: &str, out: &Output) -> anyhow::Result<()> {
    dashboard.select_dataset(name).await;
    let view = SelectView {
        dataset: &dashboard.state().config.dataset,
        target_classes: target_classes(name),
    };

    out.emit(&view, |v| {
        format!(
            "Selected dataset: {}\nTarget classes: {}",
            v.dataset,
            v.target_classes.join(", ")
        )
    })
}

pub async fn upload_dataset(dashboard: &mut Dashboard, file: &Path, out: &Output) -> anyhow::Result<()> {
    dashboard.upload_dataset(file).await?;
    let uploaded = file.display().to_string();
    out.emit(&serde_json::json!({ "uploaded": uploaded }), |_| format!("Uploaded {}", uploaded))
}

// ============================================================================
// RUN
// ============================================================================

pub async fn run(dashboard: &mut Dashboard, config: RunConfig, out: &Output) -> anyhow::Result<()> {
    dashboard.update_config(config);

    let bar = if out.json { ProgressBar::hidden() } else { ProgressBar::new(100) };
    if let Ok(style) = ProgressStyle::default_bar().template("{bar:40} {pos:>3}% {msg}") {
        bar.set_style(style);
    }

    let outcome = dashboard
        .run_to_completion(|state| {
            bar.set_position(state.progress as u64);
            bar.set_message(phase_label(state));
        })
        .await;
    bar.finish_and_clear();

    match outcome? {
        Some(outcome) => out.emit(&outcome, render_outcome),
        None => {
            let reason = dashboard
                .state()
                .error
                .clone()
                .unwrap_or_else(|| "run did not complete".to_string());
            anyhow::bail!(reason)
        }
    }
}

fn phase_label(state: &DashboardState) -> String {
    let job = state.job_id.as_ref().map(|j| j.to_string()).unwrap_or_default();
    match state.phase {
        RunPhase::Idle => "idle".to_string(),
        RunPhase::Starting => "starting".to_string(),
        RunPhase::Streaming => format!("job {} (streaming)", job),
        RunPhase::Polling => format!("job {} (polling)", job),
        RunPhase::Complete => format!("job {} (fetching results)", job),
    }
}

fn render_outcome(outcome: &RunOutcome) -> String {
    let s = &outcome.summary;
    let mut lines = vec![
        format!("Job {} on {} complete", outcome.job_id, outcome.dataset),
        format!("Before   {:>10}", s.before_records),
        format!("After    {:>10}", s.after_records),
        format!("Removed  {:>10}  ({:.1}%)", s.removed, s.reduction_pct),
        format!("  exact  {:>10}", s.removed_exact),
        format!("  fuzzy  {:>10}", s.removed_fuzzy),
    ];

    if let Some(url) = &s.download {
        lines.push(format!("Download {}", url));
    }

    if !outcome.sample_pairs.is_empty() {
        lines.push(String::new());
        lines.push("Sample pairs:".to_string());
        for pair in outcome.sample_pairs.iter().take(10) {
            lines.push(format!("  {:>5.1}  {}  <->  {}", pair.similarity, pair.i_text, pair.j_text));
        }
    }
    lines.join("\n")
}

// ============================================================================
// HISTORY
// ============================================================================

pub fn show_history(dashboard: &Dashboard, clear: bool, out: &Output) -> anyhow::Result<()> {
    if clear {
        dashboard.history_store().clear()?;
        return out.emit(&Vec::<HistoryEntry>::new(), |_| "History cleared".to_string());
    }

    out.emit(&dashboard.history(), |entries| render_history(entries))
}

fn render_history(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return "No completed runs yet".to_string();
    }

    entries
        .iter()
        .map(|e| {
            format!(
                "{}  {:<12} {:<16} {:>8} -> {:<8} -{} ({:.1}%){}",
                e.ts.format("%Y-%m-%d %H:%M:%S"),
                e.job_id,
                e.dataset,
                e.before,
                e.after,
                e.removed,
                e.reduction,
                e.download_url
                    .as_deref()
                    .map(|u| format!("  {}", u))
                    .unwrap_or_default()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use unlearning_dashboard::logic::backend::JobId;
    use unlearning_dashboard::logic::overview::sample_nodes;
    use unlearning_dashboard::logic::results::{ResultSummary, SamplePair};

    #[test]
    fn test_render_nodes_table() {
        let table = render_nodes(&sample_nodes());
        assert_eq!(table.lines().count(), 6);
        assert!(table.lines().next().unwrap().starts_with("ID"));
    }

    #[test]
    fn test_render_outcome() {
        let outcome = RunOutcome {
            job_id: JobId::new("j-1").unwrap(),
            dataset: "FAKER-NAMES".into(),
            summary: ResultSummary {
                before_records: 1200,
                after_records: 1080,
                removed: 120,
                reduction_pct: 10.0,
                download: Some("http://localhost:8000/api/download/j-1".into()),
                ..Default::default()
            },
            sample_pairs: vec![SamplePair {
                i_text: "Grace Alesci".into(),
                j_text: "Grace Alesci-Pettitt".into(),
                similarity: 92.3,
            }],
            completed_at: chrono::Utc::now(),
        };

        let text = render_outcome(&outcome);
        assert!(text.contains("Job j-1 on FAKER-NAMES complete"));
        assert!(text.contains("(10.0%)"));
        assert!(text.contains("Grace Alesci-Pettitt"));
        assert!(text.contains("/api/download/j-1"));
    }

    #[test]
    fn test_render_empty_history() {
        assert_eq!(render_history(&[]), "No completed runs yet");
    }
}
