//! Dashboard Controller
//!
//! Single owner of [`DashboardState`]. User actions and observer events are
//! turned into reducer events here; nothing else mutates the state.
//!
//! Run lifecycle:
//! 1. `start_run`: validate, tear down the previous observer, POST the config
//! 2. Job id found -> observer task started (stream, then poll on failure)
//! 3. `next_update`: apply one observer event
//! 4. Completion -> `finish`: one results fetch, history append, overview refresh


use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::logic::backend::{ApiError, Backend, JobId};
use crate::logic::form::{validate_run_config, RunConfig};
use crate::logic::history::{HistoryEntry, HistoryStore};
use crate::logic::progress::{ObserverConfig, ObserverEvent, ProgressObserver};
use crate::logic::results::{ResultSummary, RunOutcome};
use crate::logic::state::{reduce, DashboardState, Event, OverviewUpdate, RunPhase};

/// CSV column every uploaded dataset must carry
pub const SUBJECT_ID_COLUMN: &str = "data_subject_id";

const RESULTS_FAILED: &str = "failed to fetch results";

pub struct Dashboard {
    backend: Arc<dyn Backend>,
    history: HistoryStore,
    observer_config: ObserverConfig,
    state: DashboardState,
    observer: Option<ProgressObserver>,
    events: Option<mpsc::UnboundedReceiver<ObserverEvent>>,
}

impl Dashboard {
    pub fn new(backend: Arc<dyn Backend>, history: HistoryStore, observer_config: ObserverConfig) -> Self {
        Self {
            backend,
            history,
            observer_config,
            state: DashboardState::default(),
            observer: None,
            events: None,
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history.load()
    }

    pub fn history_store(&self) -> &HistoryStore {
        &self.history
    }

    fn dispatch(&mut self, event: Event) {
        let state = std::mem::take(&mut self.state);
        self.state = reduce(state, event);
    }

    // ========================================================================
    // FORM
    // ========================================================================

    pub fn update_config(&mut self, config: RunConfig) {
        self.dispatch(Event::ConfigChanged(config));
    }

    /// Switch dataset: form update, backend notification, overview refresh.
    /// Backend failures are logged only.
    pub async fn select_dataset(&mut self, name: &str) {
        let config = self.state.config.clone().with_dataset(name);
        self.dispatch(Event::ConfigChanged(config));

        if let Err(e) = self.backend.select_dataset(name).await {
            log::warn!("Dataset selection not acknowledged by backend: {}", e);
        }
        self.refresh().await;
    }

    /// Upload a CSV dataset. Failures are shown on the error banner.
    pub async fn upload_dataset(&mut self, path: &Path) -> Result<(), ApiError> {
        let result = self.try_upload(path).await;
        if let Err(e) = &result {
            log::error!("Dataset upload failed: {}", e);
            self.dispatch(Event::ErrorRaised(format!("Upload failed: {}", e)));
        }
        result
    }

    async fn try_upload(&self, path: &Path) -> Result<(), ApiError> {
        let contents = tokio::fs::read(path).await?;
        if !has_subject_column(&contents) {
            return Err(ApiError::Upload(format!(
                "CSV header has no {} column",
                SUBJECT_ID_COLUMN
            )));
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "dataset.csv".to_string());

        self.backend.upload_dataset(&file_name, contents).await
    }

    pub async fn datasets(&self) -> Result<Vec<String>, ApiError> {
        self.backend.list_datasets().await
    }

    // ========================================================================
    // OVERVIEW
    // ========================================================================

    /// Reload KPIs, nodes and health concurrently. Parts that fail keep
    /// their previous value.
    pub async fn refresh(&mut self) {
        let (kpis, nodes, health) = tokio::join!(
            self.backend.kpis(),
            self.backend.nodes(),
            self.backend.health(),
        );

        let update = OverviewUpdate {
            kpis: kpis.map_err(|e| log::warn!("KPI refresh failed: {}", e)).ok(),
            nodes: nodes.map_err(|e| log::warn!("Node refresh failed: {}", e)).ok(),
            health: health.map_err(|e| log::warn!("Health refresh failed: {}", e)).ok(),
        };
        self.dispatch(Event::DataRefreshed(update));
    }

    // ========================================================================
    // RUN
    // ========================================================================

    /// Submit the current configuration and start observing the job
    pub async fn start_run(&mut self) -> Result<JobId, ApiError> {
        if let Err(e) = validate_run_config(&self.state.config) {
            self.dispatch(Event::ErrorRaised(e.to_string()));
            return Err(e.into());
        }

        self.stop_observer().await;
        self.dispatch(Event::RunRequested);

        let response = match self.backend.start_run(&self.state.config).await {
            Ok(response) => response,
            Err(e) => {
                log::error!("Run request failed: {}", e);
                self.dispatch(Event::RunFailed(format!("Run request failed: {}", e)));
                return Err(e);
            }
        };

        let job = match response.job_id() {
            Some(job) => job,
            None => {
                let err = ApiError::MissingJobId;
                log::error!("{}", err);
                self.dispatch(Event::RunFailed(err.to_string()));
                return Err(err);
            }
        };

        log::info!("Run started: job {}", job);
        self.dispatch(Event::RunStarted(job.clone()));

        let (tx, rx) = mpsc::unbounded_channel();
        self.observer = Some(ProgressObserver::spawn(
            self.backend.clone(),
            job.clone(),
            self.observer_config.clone(),
            tx,
        ));
        self.events = Some(rx);

        Ok(job)
    }

    /// Wait for and apply the next observer event. `None` when no run is
    /// being observed.
    pub async fn next_update(&mut self) -> Option<ObserverEvent> {
        let event = self.events.as_mut()?.recv().await;

        match &event {
            Some(ObserverEvent::Progress(pct)) => self.dispatch(Event::ProgressReceived(*pct)),
            Some(ObserverEvent::FellBackToPolling) => self.dispatch(Event::StreamFailed),
            Some(ObserverEvent::Complete) => {
                self.dispatch(Event::ProgressComplete);
                self.finish().await;
            }
            Some(ObserverEvent::Stalled) => {
                self.stop_observer().await;
                let message = match self.observer_config.stall_timeout {
                    Some(timeout) => format!("Run stalled: no progress for {}s", timeout.as_secs()),
                    None => "Run stalled".to_string(),
                };
                self.dispatch(Event::RunFailed(message));
            }
            None => {
                // Observer ended without a terminal event
                self.events = None;
                if self.state.is_observing() {
                    self.stop_observer().await;
                    self.dispatch(Event::RunFailed("Progress observation ended unexpectedly".into()));
                }
            }
        }
        event
    }

    /// Fetch results once for the completed job and record the run
    async fn finish(&mut self) {
        self.stop_observer().await;

        let Some(job) = self.state.job_id.clone() else {
            return;
        };
        if self.state.phase != RunPhase::Complete {
            return;
        }

        match self.backend.results(&job).await {
            Ok(doc) => {
                let summary = ResultSummary::from_document(&doc, self.backend.base_url());
                let outcome = RunOutcome {
                    job_id: job,
                    dataset: doc
                        .dataset_name
                        .clone()
                        .unwrap_or_else(|| self.state.config.dataset.clone()),
                    summary,
                    sample_pairs: doc.sample_pairs,
                    completed_at: chrono::Utc::now(),
                };

                if let Err(e) = self.history.append(HistoryEntry::from(&outcome)) {
                    log::error!("Failed to save run history: {}", e);
                }
                log::info!(
                    "Run {} complete: {} -> {} records",
                    outcome.job_id,
                    outcome.summary.before_records,
                    outcome.summary.after_records
                );
                self.dispatch(Event::RunCompleted(outcome));
            }
            Err(e) => {
                log::error!("Results fetch for job {} failed: {}", job, e);
                self.dispatch(Event::RunFailed(RESULTS_FAILED.to_string()));
            }
        }

        self.refresh().await;
    }

    /// Start a run and drive it to the end, calling `on_update` after every
    /// applied event. Returns the outcome, or `None` if the run failed after
    /// it started (see `state().error`).
    pub async fn run_to_completion<F>(&mut self, mut on_update: F) -> Result<Option<RunOutcome>, ApiError>
    where
        F: FnMut(&DashboardState),
    {
        self.start_run().await?;
        on_update(&self.state);

        while self.state.is_running() {
            if self.next_update().await.is_none() {
                break;
            }
            on_update(&self.state);
        }

        Ok(self.state.outcome.clone())
    }

    /// Stop observing and mark the run as no longer in progress
    pub async fn teardown(&mut self) {
        self.stop_observer().await;
        self.dispatch(Event::TornDown);
    }

    async fn stop_observer(&mut self) {
        self.events = None;
        if let Some(observer) = self.observer.take() {
            log::debug!("Stopping progress observer for job {}", observer.job());
            observer.shutdown().await;
        }
    }
}

/// First CSV line contains the subject id column
fn has_subject_column(contents: &[u8]) -> bool {
    let header = contents.split(|b| *b == b'\n').next().unwrap_or_default();
    String::from_utf8_lossy(header)
        .trim_start_matches('\u{feff}')
        .split(',')
        .any(|column| column.trim().trim_matches('"').eq_ignore_ascii_case(SUBJECT_ID_COLUMN))
}
