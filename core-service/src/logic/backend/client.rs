//! Unlearning API Client
//!
//! HTTP client for the external unlearning backend.

use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ApiError, Backend, JobId, ProgressStream, RunResponse};
use crate::constants;
use crate::logic::form::RunConfig;
use crate::logic::overview::{HealthGauges, Kpis, Node, NodesPayload};
use crate::logic::progress::{SseDecoder, SseEvent};
use crate::logic::results::ResultsDocument;

/// Backend connection settings
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: constants::get_api_url(),
            request_timeout: constants::get_request_timeout(),
        }
    }
}

/// HTTP implementation of [`Backend`]
pub struct DashboardClient {
    base_url: String,
    http_client: reqwest::Client,
    /// No overall timeout: a progress stream stays open for the whole job
    stream_client: reqwest::Client,
}

// Request/Response types

#[derive(Debug, Serialize)]
struct SelectDatasetRequest<'a> {
    name: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DatasetsPayload {
    List(Vec<String>),
    Items { items: Vec<String> },
}

impl DashboardClient {
    /// Create new backend client
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        let stream_client = reqwest::Client::builder()
            .connect_timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http_client,
            stream_client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.http_client
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if response.status().is_success() {
            response.json().await
                .map_err(|e| ApiError::Parse(e.to_string()))
        } else {
            Err(ApiError::Status(response.status().as_u16()))
        }
    }
}

#[async_trait]
impl Backend for DashboardClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn list_datasets(&self) -> Result<Vec<String>, ApiError> {
        let payload: DatasetsPayload = self.get_json("/api/datasets").await?;
        Ok(match payload {
            DatasetsPayload::List(items) | DatasetsPayload::Items { items } => items,
        })
    }

    async fn select_dataset(&self, name: &str) -> Result<(), ApiError> {
        let response = self.http_client
            .post(self.url("/api/datasets/select"))
            .json(&SelectDatasetRequest { name })
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if response.status().is_success() {
            log::debug!("Dataset selected on backend: {}", name);
            Ok(())
        } else {
            Err(ApiError::Status(response.status().as_u16()))
        }
    }

    async fn upload_dataset(&self, file_name: &str, contents: Vec<u8>) -> Result<(), ApiError> {
        let part = reqwest::multipart::Part::bytes(contents)
            .file_name(file_name.to_string())
            .mime_str("text/csv")
            .map_err(|e| ApiError::Upload(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        log::info!("Uploading dataset {} to {}", file_name, self.base_url);

        let response = self.http_client
            .post(self.url("/api/upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            log::error!("Upload failed ({}): {}", status, error_text);
            Err(ApiError::Upload(format!("server answered {}", status)))
        }
    }

    async fn kpis(&self) -> Result<Kpis, ApiError> {
        self.get_json("/api/kpis").await
    }

    async fn nodes(&self) -> Result<Vec<Node>, ApiError> {
        let payload: NodesPayload = self.get_json("/api/nodes").await?;
        Ok(payload.into_nodes())
    }

    async fn health(&self) -> Result<HealthGauges, ApiError> {
        self.get_json("/api/health").await
    }

    async fn start_run(&self, config: &RunConfig) -> Result<RunResponse, ApiError> {
        log::info!("Starting run on {} (dataset: {})", self.base_url, config.dataset);

        let response = self.http_client
            .post(self.url("/api/run"))
            .json(config)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            log::error!("Run request failed ({}): {}", status, error_text);
            return Err(ApiError::Status(status));
        }

        let header_job_id = response
            .headers()
            .get(constants::JOB_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let text = response.text().await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let body = serde_json::from_str(&text).ok();

        Ok(RunResponse { body, header_job_id })
    }

    async fn open_progress_stream(&self, job: &JobId) -> Result<Box<dyn ProgressStream>, ApiError> {
        let response = self.stream_client
            .get(self.url("/api/progress"))
            .query(&[("job_id", job.as_str())])
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ApiError::Status(response.status().as_u16()));
        }

        log::debug!("Progress stream opened for job {}", job);

        let inner = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()))
            .boxed();

        Ok(Box::new(HttpProgressStream::new(inner)))
    }

    async fn poll_progress(&self, job: &JobId) -> Result<String, ApiError> {
        let response = self.http_client
            .get(self.url("/api/progress"))
            .query(&[("job_id", job.as_str()), ("mode", "poll")])
            .header(ACCEPT, "text/plain")
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if response.status().is_success() {
            response.text().await
                .map_err(|e| ApiError::Network(e.to_string()))
        } else {
            Err(ApiError::Status(response.status().as_u16()))
        }
    }

    async fn results(&self, job: &JobId) -> Result<ResultsDocument, ApiError> {
        let response = self.http_client
            .get(self.url("/api/results"))
            .query(&[("job_id", job.as_str())])
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if response.status().is_success() {
            response.json().await
                .map_err(|e| ApiError::Parse(e.to_string()))
        } else {
            Err(ApiError::Status(response.status().as_u16()))
        }
    }
}

// ============================================================================
// SSE STREAM
// ============================================================================

type ByteStream = BoxStream<'static, Result<Vec<u8>, reqwest::Error>>;

/// `text/event-stream` body decoded into events
pub struct HttpProgressStream {
    inner: Option<ByteStream>,
    decoder: SseDecoder,
    pending: std::collections::VecDeque<SseEvent>,
}

impl HttpProgressStream {
    fn new(inner: ByteStream) -> Self {
        Self {
            inner: Some(inner),
            decoder: SseDecoder::new(),
            pending: Default::default(),
        }
    }
}

#[async_trait]
impl ProgressStream for HttpProgressStream {
    async fn next_event(&mut self) -> Option<Result<SseEvent, ApiError>> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(Ok(event));
            }

            let inner = self.inner.as_mut()?;
            match inner.next().await {
                Some(Ok(chunk)) => self.pending.extend(self.decoder.feed(&chunk)),
                Some(Err(e)) => {
                    self.inner = None;
                    return Some(Err(ApiError::Network(e.to_string())));
                }
                None => {
                    self.inner = None;
                    return self.decoder.finish().map(Ok);
                }
            }
        }
    }

    fn close(&mut self) {
        // Dropping the body stream closes the connection
        if self.inner.take().is_some() {
            log::debug!("Progress stream closed");
        }
        self.pending.clear();
    }
}
