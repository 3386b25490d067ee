//! Progress Observer
//!
//! One background task per job. It streams first and, if the stream fails,
//! polls. Both phases run inside the same task one after the other, so a
//! stream and a poll loop can never be active at the same time.
//!
//! Flow:
//! 1. STREAMING: SSE events update progress, `complete` ends the job
//! 2. Transport error / `error` event / stream end -> stream closed, POLLING
//! 3. POLLING: fixed interval GET, number parsed from text, "complete" ends the job
//! 4. Cancel (teardown or new run) closes the stream and stops the interval

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::parse::{classify, extract_percent, is_complete_text, StreamSignal};
use crate::constants;
use crate::logic::backend::{Backend, JobId};

/// Observer tuning
#[derive(Debug, Clone)]
pub struct ObserverConfig {
    pub poll_interval: Duration,
    /// Fail the job when progress does not change for this long
    pub stall_timeout: Option<Duration>,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            poll_interval: constants::get_poll_interval(),
            stall_timeout: constants::get_stall_timeout(),
        }
    }
}

/// Events sent from the observer task to the dashboard
#[derive(Debug, Clone, PartialEq)]
pub enum ObserverEvent {
    Progress(u8),
    FellBackToPolling,
    Complete,
    Stalled,
}

/// Handle to a running observer task
pub struct ProgressObserver {
    job: JobId,
    cancel: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl ProgressObserver {
    /// Start observing `job`. Events are delivered on `events`.
    pub fn spawn(
        backend: Arc<dyn Backend>,
        job: JobId,
        config: ObserverConfig,
        events: mpsc::UnboundedSender<ObserverEvent>,
    ) -> Self {
        let (cancel, cancel_rx) = watch::channel(false);
        let task_job = job.clone();

        let task = tokio::spawn(async move {
            observe(backend, task_job, config, events, cancel_rx).await;
        });

        Self {
            job,
            cancel,
            task: Some(task),
        }
    }

    pub fn job(&self) -> &JobId {
        &self.job
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Signal the task to stop. Returns immediately.
    pub fn cancel(&self) {
        let _ = self.cancel.send(true);
    }

    /// Stop the task and wait until it has closed its connections
    pub async fn shutdown(mut self) {
        self.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                log::warn!("Progress observer for job {} ended abnormally: {}", self.job, e);
            }
        }
    }
}

impl Drop for ProgressObserver {
    fn drop(&mut self) {
        self.cancel();
    }
}

// ============================================================================
// TASK
// ============================================================================

enum StreamOutcome {
    Complete,
    Fallback,
    Stalled,
    Cancelled,
}

/// Tracks the last progress change for the stall timeout
struct Watchdog {
    timeout: Option<Duration>,
    deadline: Option<Instant>,
    last: Option<u8>,
}

impl Watchdog {
    fn new(timeout: Option<Duration>) -> Self {
        Self {
            timeout,
            deadline: timeout.map(|t| Instant::now() + t),
            last: None,
        }
    }

    fn observe(&mut self, pct: u8) {
        if self.last != Some(pct) {
            self.last = Some(pct);
            self.deadline = self.timeout.map(|t| Instant::now() + t);
        }
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}

/// Resolves once cancel was requested or the handle was dropped
async fn cancelled(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow() {
            return;
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}

fn emit(events: &mpsc::UnboundedSender<ObserverEvent>, event: ObserverEvent) -> bool {
    events.send(event).is_ok()
}

async fn observe(
    backend: Arc<dyn Backend>,
    job: JobId,
    config: ObserverConfig,
    events: mpsc::UnboundedSender<ObserverEvent>,
    mut cancel: watch::Receiver<bool>,
) {
    let mut watchdog = Watchdog::new(config.stall_timeout);

    match stream_phase(backend.as_ref(), &job, &events, &mut cancel, &mut watchdog).await {
        StreamOutcome::Complete => {
            emit(&events, ObserverEvent::Complete);
        }
        StreamOutcome::Stalled => {
            log::warn!("Job {} stalled while streaming", job);
            emit(&events, ObserverEvent::Stalled);
        }
        StreamOutcome::Cancelled => {
            log::debug!("Progress observer for job {} cancelled", job);
        }
        StreamOutcome::Fallback => {
            if emit(&events, ObserverEvent::FellBackToPolling) {
                poll_phase(backend.as_ref(), &job, &config, &events, &mut cancel, &mut watchdog).await;
            }
        }
    }
}

async fn stream_phase(
    backend: &dyn Backend,
    job: &JobId,
    events: &mpsc::UnboundedSender<ObserverEvent>,
    cancel: &mut watch::Receiver<bool>,
    watchdog: &mut Watchdog,
) -> StreamOutcome {
    let opened = tokio::select! {
        _ = cancelled(cancel) => return StreamOutcome::Cancelled,
        opened = backend.open_progress_stream(job) => opened,
    };

    let mut stream = match opened {
        Ok(stream) => stream,
        Err(e) => {
            log::warn!("Progress stream for job {} failed to open: {}", job, e);
            return StreamOutcome::Fallback;
        }
    };

    let outcome = loop {
        let deadline = watchdog.deadline;

        tokio::select! {
            _ = cancelled(cancel) => break StreamOutcome::Cancelled,
            _ = sleep_until_opt(deadline) => break StreamOutcome::Stalled,
            item = stream.next_event() => match item {
                Some(Ok(event)) => match classify(&event) {
                    StreamSignal::Progress(pct) => {
                        watchdog.observe(pct);
                        if !emit(events, ObserverEvent::Progress(pct)) {
                            break StreamOutcome::Cancelled;
                        }
                    }
                    StreamSignal::Complete => break StreamOutcome::Complete,
                    StreamSignal::Error(msg) => {
                        log::warn!("Progress stream for job {} reported error: {}", job, msg);
                        break StreamOutcome::Fallback;
                    }
                    StreamSignal::Ignored => {}
                },
                Some(Err(e)) => {
                    log::warn!("Progress stream for job {} failed: {}", job, e);
                    break StreamOutcome::Fallback;
                }
                None => {
                    log::warn!("Progress stream for job {} ended before completion", job);
                    break StreamOutcome::Fallback;
                }
            },
        }
    };

    stream.close();
    outcome
}

async fn poll_phase(
    backend: &dyn Backend,
    job: &JobId,
    config: &ObserverConfig,
    events: &mpsc::UnboundedSender<ObserverEvent>,
    cancel: &mut watch::Receiver<bool>,
    watchdog: &mut Watchdog,
) {
    log::info!("Polling progress for job {} every {:?}", job, config.poll_interval);

    let mut ticker = tokio::time::interval_at(
        Instant::now() + config.poll_interval,
        config.poll_interval,
    );
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let deadline = watchdog.deadline;

        tokio::select! {
            _ = cancelled(cancel) => {
                log::debug!("Progress polling for job {} cancelled", job);
                return;
            }
            _ = sleep_until_opt(deadline) => {
                log::warn!("Job {} stalled while polling", job);
                emit(events, ObserverEvent::Stalled);
                return;
            }
            _ = ticker.tick() => {}
        }

        let polled = tokio::select! {
            _ = cancelled(cancel) => return,
            polled = backend.poll_progress(job) => polled,
        };

        match polled {
            Ok(text) => {
                if let Some(pct) = extract_percent(&text) {
                    watchdog.observe(pct);
                    if !emit(events, ObserverEvent::Progress(pct)) {
                        return;
                    }
                }
                if is_complete_text(&text) {
                    emit(events, ObserverEvent::Complete);
                    return;
                }
            }
            Err(e) => log::warn!("Progress poll for job {} failed: {}", job, e),
        }
    }
}
