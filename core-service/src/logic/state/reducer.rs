use serde::Serialize;

use crate::logic::backend::JobId;
use crate::logic::form::RunConfig;
use crate::logic::overview::{sample_nodes, HealthGauges, Kpis, Node};
use crate::logic::results::RunOutcome;

/// Where the current run is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    #[default]
    Idle,
    /// Run request sent, job id not known yet
    Starting,
    Streaming,
    Polling,
    /// Job finished, results being fetched
    Complete,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardState {
    pub config: RunConfig,
    pub phase: RunPhase,
    pub job_id: Option<JobId>,
    /// 0..=100
    pub progress: u8,
    pub results_open: bool,
    pub outcome: Option<RunOutcome>,
    /// User visible error banner
    pub error: Option<String>,
    pub kpis: Kpis,
    pub nodes: Vec<Node>,
    pub health: HealthGauges,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            config: RunConfig::default(),
            phase: RunPhase::Idle,
            job_id: None,
            progress: 0,
            results_open: false,
            outcome: None,
            error: None,
            kpis: Kpis::sample(),
            nodes: sample_nodes(),
            health: HealthGauges::sample(),
        }
    }
}

impl DashboardState {
    pub fn is_running(&self) -> bool {
        !matches!(self.phase, RunPhase::Idle)
    }

    /// Stream or poll loop is expected to be delivering progress
    pub fn is_observing(&self) -> bool {
        matches!(self.phase, RunPhase::Streaming | RunPhase::Polling)
    }
}

/// Partial overview refresh; `None` keeps the current value
#[derive(Debug, Clone, Default)]
pub struct OverviewUpdate {
    pub kpis: Option<Kpis>,
    pub nodes: Option<Vec<Node>>,
    pub health: Option<HealthGauges>,
}

#[derive(Debug, Clone)]
pub enum Event {
    ConfigChanged(RunConfig),
    /// User pressed "Apply & Start Run"
    RunRequested,
    RunStarted(JobId),
    ProgressReceived(u8),
    /// Stream transport failed, polling takes over
    StreamFailed,
    /// Job reported completion, results not fetched yet
    ProgressComplete,
    RunCompleted(RunOutcome),
    RunFailed(String),
    /// Dashboard torn down, observation cancelled
    TornDown,
    DataRefreshed(OverviewUpdate),
    ErrorRaised(String),
}

pub fn reduce(mut state: DashboardState, event: Event) -> DashboardState {
    match event {
        Event::ConfigChanged(config) => {
            state.config = config;
        }
        Event::RunRequested => {
            state.phase = RunPhase::Starting;
            state.job_id = None;
            state.progress = 0;
            state.outcome = None;
            state.error = None;
            state.results_open = true;
        }
        Event::RunStarted(job_id) => {
            if state.phase == RunPhase::Starting {
                state.phase = RunPhase::Streaming;
                state.job_id = Some(job_id);
            }
        }
        Event::ProgressReceived(pct) => {
            if state.is_observing() {
                state.progress = pct.min(100);
            }
        }
        Event::StreamFailed => {
            // Progress is kept until the first poll answers
            if state.phase == RunPhase::Streaming {
                state.phase = RunPhase::Polling;
            }
        }
        Event::ProgressComplete => {
            if state.is_observing() {
                state.phase = RunPhase::Complete;
            }
        }
        Event::RunCompleted(outcome) => {
            if state.is_running() {
                state.phase = RunPhase::Idle;
                state.progress = 100;
                state.outcome = Some(outcome);
            }
        }
        Event::RunFailed(message) => {
            state.phase = RunPhase::Idle;
            state.progress = 0;
            state.error = Some(message);
        }
        Event::TornDown => {
            if state.is_running() {
                state.phase = RunPhase::Idle;
                state.progress = 0;
            }
        }
        Event::DataRefreshed(update) => {
            if let Some(kpis) = update.kpis {
                state.kpis = kpis;
            }
            if let Some(nodes) = update.nodes {
                state.nodes = nodes;
            }
            if let Some(health) = update.health {
                state.health = health;
            }
        }
        Event::ErrorRaised(message) => {
            state.error = Some(message);
        }
    }
    state
}
