//! In-memory `Backend` for controller and observer tests

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::logic::backend::{ApiError, Backend, JobId, ProgressStream, RunResponse};
use crate::logic::form::RunConfig;
use crate::logic::overview::{HealthGauges, Kpis, Node};
use crate::logic::progress::SseEvent;
use crate::logic::results::ResultsDocument;

/// One scripted step of a mock progress stream
#[derive(Debug, Clone)]
pub enum StreamStep {
    Event(SseEvent),
    Fail,
    /// Never yields again
    Hang,
}

impl StreamStep {
    pub fn progress(pct: &str) -> Self {
        StreamStep::Event(SseEvent::new("progress", pct))
    }

    pub fn complete() -> Self {
        StreamStep::Event(SseEvent::new("complete", "done"))
    }
}

#[derive(Default)]
pub struct Counters {
    pub start_run: AtomicUsize,
    pub stream_opens: AtomicUsize,
    pub stream_closes: AtomicUsize,
    pub polls: AtomicUsize,
    pub results: AtomicUsize,
    pub kpis: AtomicUsize,
    pub selects: AtomicUsize,
    pub uploads: AtomicUsize,
}

impl Counters {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

pub struct MockBackend {
    pub counters: Arc<Counters>,
    pub run_response: Mutex<Result<RunResponse, u16>>,
    pub stream_script: Mutex<Vec<StreamStep>>,
    pub stream_open_fails: Mutex<bool>,
    /// Answers in order, the last one repeats
    pub poll_answers: Mutex<VecDeque<Result<String, u16>>>,
    pub results_doc: Mutex<Result<ResultsDocument, u16>>,
    pub fail_overview: Mutex<bool>,
    pub last_run_body: Mutex<Option<Value>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            counters: Arc::new(Counters::default()),
            run_response: Mutex::new(Ok(RunResponse {
                body: Some(json!({"job_id": "job-1"})),
                header_job_id: None,
            })),
            stream_script: Mutex::new(vec![StreamStep::complete()]),
            stream_open_fails: Mutex::new(false),
            poll_answers: Mutex::new(VecDeque::new()),
            results_doc: Mutex::new(Ok(sample_results())),
            fail_overview: Mutex::new(false),
            last_run_body: Mutex::new(None),
        }
    }

    pub fn with_stream(self, steps: Vec<StreamStep>) -> Self {
        *self.stream_script.lock() = steps;
        self
    }

    pub fn with_polls(self, answers: Vec<Result<&str, u16>>) -> Self {
        *self.poll_answers.lock() = answers
            .into_iter()
            .map(|a| a.map(str::to_string))
            .collect();
        self
    }

    pub fn with_run_response(self, response: RunResponse) -> Self {
        *self.run_response.lock() = Ok(response);
        self
    }

    pub fn with_results(self, results: Result<ResultsDocument, u16>) -> Self {
        *self.results_doc.lock() = results;
        self
    }

    pub fn stream_opens(&self) -> usize {
        Counters::get(&self.counters.stream_opens)
    }

    pub fn stream_closes(&self) -> usize {
        Counters::get(&self.counters.stream_closes)
    }

    pub fn polls(&self) -> usize {
        Counters::get(&self.counters.polls)
    }

    pub fn results_calls(&self) -> usize {
        Counters::get(&self.counters.results)
    }
}

pub fn sample_results() -> ResultsDocument {
    serde_json::from_value(json!({
        "summary": {
            "before_records": 1000,
            "after_records": 900,
            "removed": 100,
            "reduction_pct": 10.0,
            "removed_exact": 80,
            "removed_fuzzy": 20
        },
        "sample_pairs": [],
        "download": "/api/download/job-1",
        "dataset_name": "CIFAR-10"
    }))
    .unwrap()
}

#[async_trait]
impl Backend for MockBackend {
    fn base_url(&self) -> &str {
        "http://mock:8000"
    }

    async fn list_datasets(&self) -> Result<Vec<String>, ApiError> {
        Ok(vec!["MNIST".into(), "CIFAR-10".into()])
    }

    async fn select_dataset(&self, _name: &str) -> Result<(), ApiError> {
        self.counters.selects.fetch_add(1, Ordering::SeqCst);
        if *self.fail_overview.lock() {
            return Err(ApiError::Status(500));
        }
        Ok(())
    }

    async fn upload_dataset(&self, _file_name: &str, _contents: Vec<u8>) -> Result<(), ApiError> {
        self.counters.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn kpis(&self) -> Result<Kpis, ApiError> {
        self.counters.kpis.fetch_add(1, Ordering::SeqCst);
        if *self.fail_overview.lock() {
            return Err(ApiError::Network("refused".into()));
        }
        Ok(Kpis {
            total_nodes: 7,
            ..Kpis::sample()
        })
    }

    async fn nodes(&self) -> Result<Vec<Node>, ApiError> {
        if *self.fail_overview.lock() {
            return Err(ApiError::Network("refused".into()));
        }
        Ok(crate::logic::overview::sample_nodes().into_iter().take(2).collect())
    }

    async fn health(&self) -> Result<HealthGauges, ApiError> {
        if *self.fail_overview.lock() {
            return Err(ApiError::Network("refused".into()));
        }
        Ok(HealthGauges {
            latency_ms: 10.0,
            ..HealthGauges::sample()
        })
    }

    async fn start_run(&self, config: &RunConfig) -> Result<RunResponse, ApiError> {
        self.counters.start_run.fetch_add(1, Ordering::SeqCst);
        *self.last_run_body.lock() = serde_json::to_value(config).ok();
        self.run_response.lock().clone().map_err(ApiError::Status)
    }

    async fn open_progress_stream(&self, _job: &JobId) -> Result<Box<dyn ProgressStream>, ApiError> {
        self.counters.stream_opens.fetch_add(1, Ordering::SeqCst);
        if *self.stream_open_fails.lock() {
            return Err(ApiError::Network("connection refused".into()));
        }
        Ok(Box::new(MockStream {
            steps: self.stream_script.lock().clone().into(),
            counters: self.counters.clone(),
            closed: false,
        }))
    }

    async fn poll_progress(&self, _job: &JobId) -> Result<String, ApiError> {
        self.counters.polls.fetch_add(1, Ordering::SeqCst);
        let mut answers = self.poll_answers.lock();
        let answer = if answers.len() > 1 {
            answers.pop_front()
        } else {
            answers.front().cloned()
        };
        match answer {
            Some(Ok(text)) => Ok(text),
            Some(Err(status)) => Err(ApiError::Status(status)),
            None => Ok("0%".to_string()),
        }
    }

    async fn results(&self, _job: &JobId) -> Result<ResultsDocument, ApiError> {
        self.counters.results.fetch_add(1, Ordering::SeqCst);
        self.results_doc.lock().clone().map_err(ApiError::Status)
    }
}

pub struct MockStream {
    steps: VecDeque<StreamStep>,
    counters: Arc<Counters>,
    closed: bool,
}

#[async_trait]
impl ProgressStream for MockStream {
    async fn next_event(&mut self) -> Option<Result<SseEvent, ApiError>> {
        if self.closed {
            return None;
        }
        match self.steps.pop_front()? {
            StreamStep::Event(event) => Some(Ok(event)),
            StreamStep::Fail => Some(Err(ApiError::Network("stream reset".into()))),
            StreamStep::Hang => std::future::pending().await,
        }
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.counters.stream_closes.fetch_add(1, Ordering::SeqCst);
        }
    }
}
