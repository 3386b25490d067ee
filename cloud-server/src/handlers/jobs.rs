//! Run / progress / results handlers

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{
        sse::{Event, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::stream::{self, Stream};
use serde::Deserialize;
use std::convert::Infallible;
use uuid::Uuid;
use validator::Validate;

use crate::{engine, AppError, AppResult, AppState};
use crate::models::{ActiveDataset, Job, ResultsResponse, RunAccepted, RunRequest};

pub const JOB_ID_HEADER: &str = "x-job-id";

#[derive(Debug, Deserialize)]
pub struct JobQuery {
    pub job_id: String,
    /// `poll` forces the plain text answer
    pub mode: Option<String>,
}

fn parse_job_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}

/// Start a simulated job. The id is returned in the body and in `x-job-id`.
pub async fn run(
    State(state): State<AppState>,
    Json(req): Json<RunRequest>,
) -> AppResult<Response> {
    req.validate()?;

    let active = state.store.dataset();
    let (dataset, records) = match req.dataset.as_deref() {
        Some(name) if name != active.name => {
            let known = ActiveDataset::from_catalogue(name)
                .ok_or_else(|| AppError::NotFound(format!("Unknown dataset: {}", name)))?;
            (known.name, known.records)
        }
        _ => (active.name, active.records),
    };

    let job_id = state.store.insert_job(Job::new(dataset.clone(), records, req));
    tracing::info!(job_id = %job_id, dataset = %dataset, "Job started");

    engine::spawn(state.store.clone(), job_id, state.config.job_step());

    let header_value = HeaderValue::from_str(&job_id.to_string())
        .map_err(|e| AppError::InternalError(e.to_string()))?;

    let mut response = Json(RunAccepted {
        job_id: job_id.to_string(),
        status: "running",
    })
    .into_response();
    response.headers_mut().insert(JOB_ID_HEADER, header_value);

    Ok(response)
}

/// Progress as an event stream, or as text when `mode=poll` or the
/// client does not accept `text/event-stream`
pub async fn progress(
    State(state): State<AppState>,
    Query(query): Query<JobQuery>,
    headers: HeaderMap,
) -> Response {
    let wants_stream = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map_or(false, |accept| accept.contains("text/event-stream"));
    let poll = query.mode.as_deref() == Some("poll") || !wants_stream;

    let job_id = parse_job_id(&query.job_id);

    if poll {
        return match job_id.and_then(|id| state.store.progress(&id)) {
            Some(100) => "100% complete".into_response(),
            Some(pct) => format!("{}%", pct).into_response(),
            None => (StatusCode::NOT_FOUND, "unknown job").into_response(),
        };
    }

    let mut response = Sse::new(progress_events(state, job_id)).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    response
        .headers_mut()
        .insert("x-accel-buffering", HeaderValue::from_static("no"));
    response
}

enum StreamState {
    Watching(Option<u8>),
    Done,
}

/// `progress` on every change, then `complete` once 100 was sent.
/// Unknown jobs get a single `error` event.
fn progress_events(
    state: AppState,
    job_id: Option<Uuid>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    let tick = state.config.stream_tick();

    stream::unfold(StreamState::Watching(None), move |stream_state| {
        let state = state.clone();
        async move {
            let StreamState::Watching(last) = stream_state else {
                return None;
            };

            loop {
                let Some(pct) = job_id.and_then(|id| state.store.progress(&id)) else {
                    let event = Event::default().event("error").data("unknown job");
                    return Some((Ok(event), StreamState::Done));
                };

                if last != Some(pct) {
                    let event = Event::default().event("progress").data(pct.to_string());
                    return Some((Ok(event), StreamState::Watching(Some(pct))));
                }

                if pct >= 100 {
                    let event = Event::default().event("complete").data("done");
                    return Some((Ok(event), StreamState::Done));
                }

                tokio::time::sleep(tick).await;
            }
        }
    })
}

/// Final results, 404 until the job is complete
pub async fn results(
    State(state): State<AppState>,
    Query(query): Query<JobQuery>,
) -> AppResult<Json<ResultsResponse>> {
    let job = parse_job_id(&query.job_id)
        .and_then(|id| state.store.job(&id))
        .filter(Job::is_complete)
        .ok_or_else(|| AppError::NotFound("not ready".to_string()))?;

    let Some(result) = job.result else {
        return Err(AppError::NotFound("not ready".to_string()));
    };

    let summary = result.summary;
    let duplicate_rate_before = if summary.before_records > 0 {
        summary.removed as f64 / summary.before_records as f64
    } else {
        0.0
    };

    Ok(Json(ResultsResponse {
        job_id: job.id,
        dataset_name: job.dataset,
        rows: summary.after_records,
        duplicates_removed: summary.removed,
        duplicate_rate_before,
        duplicate_rate_after: 0.0,
        summary,
        sample_pairs: result.sample_pairs,
        download: format!("{}/{}", state.config.results_base_path, job.id),
    }))
}

/// Cleaned CSV artifact of a completed job
pub async fn download(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<Response> {
    let job = parse_job_id(&job_id)
        .and_then(|id| state.store.job(&id))
        .ok_or_else(|| AppError::NotFound("file not found".to_string()))?;
    let result = job
        .result
        .ok_or_else(|| AppError::NotFound("file not found".to_string()))?;

    let disposition = format!("attachment; filename=\"deduped_{}.csv\"", job.id);
    let disposition = HeaderValue::from_str(&disposition)
        .map_err(|e| AppError::InternalError(e.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("text/csv")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        result.csv,
    )
        .into_response())
}
