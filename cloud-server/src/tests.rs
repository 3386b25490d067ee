use super::*;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use serde_json::{json, Value};
use std::time::Duration;
use tower::ServiceExt;

fn app(job_step_ms: u64) -> Router {
    let state = AppState {
        store: Arc::new(store::AppStore::new()),
        config: config::Config {
            job_step_ms,
            ..config::Config::default()
        },
    };
    create_router(state)
}

async fn send(app: &Router, req: Request<Body>) -> Response {
    app.clone().oneshot(req).await.unwrap()
}

async fn text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn json_body(response: Response) -> Value {
    serde_json::from_str(&text(response).await).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn start_run(app: &Router, body: Value) -> String {
    let response = send(app, post_json("/api/run", body)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let header_id = response.headers()["x-job-id"].to_str().unwrap().to_string();
    let body = json_body(response).await;
    assert_eq!(body["job_id"], header_id.as_str());
    header_id
}

async fn wait_complete(app: &Router, job_id: &str) {
    for _ in 0..200 {
        let response = send(app, get(&format!("/api/progress?job_id={}&mode=poll", job_id))).await;
        if text(response).await.contains("complete") {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("job {} did not complete", job_id);
}

#[tokio::test]
async fn test_datasets_and_select() {
    let app = app(1);

    let list = json_body(send(&app, get("/api/datasets")).await).await;
    assert_eq!(list["items"].as_array().unwrap().len(), 8);
    assert_eq!(list["items"][0], "MNIST");

    let selected = send(&app, post_json("/api/datasets/select", json!({"name": "mnist"}))).await;
    assert_eq!(selected.status(), StatusCode::OK);
    let selected = json_body(selected).await;
    assert_eq!(selected["dataset"], "MNIST");
    assert_eq!(selected["kpis"]["total_data_points"], 7000);

    let unknown = send(&app, post_json("/api/datasets/select", json!({"name": "nope"}))).await;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
    let error = json_body(unknown).await;
    assert_eq!(error["status"], 404);
    assert!(error["error"].as_str().unwrap().contains("nope"));
}

#[tokio::test]
async fn test_overview_endpoints() {
    let app = app(1);

    let kpis = json_body(send(&app, get("/api/kpis")).await).await;
    assert_eq!(kpis["total_nodes"], 8);
    assert_eq!(kpis["active_nodes"], 4);

    let nodes = json_body(send(&app, get("/api/nodes")).await).await;
    let items = nodes["items"].as_array().unwrap();
    assert_eq!(items.len(), 8);
    assert_eq!(items[0]["region"], "Victoria");
    assert_eq!(items[0]["status"], "active");
    for key in ["id", "name", "status", "data_points", "unlearned", "region", "duplicate_ratio"] {
        assert!(items[0].get(key).is_some(), "missing node key {}", key);
    }
    assert!(items[0].get("dataPoints").is_none());
    assert!(items[0].get("duplicateRatio").is_none());

    let health = json_body(send(&app, get("/api/health")).await).await;
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["sync_pct"], 50.0);
}

#[tokio::test]
async fn test_run_lifecycle() {
    let app = app(1);
    let job_id = start_run(
        &app,
        json!({
            "dataset": "CIFAR-10",
            "attack": {"type": "duplication", "duplicateRatio": 20, "strategy": "random",
                       "targetClass": "auto", "clientsAffected": 50},
            "gdpr": {"subjectId": "", "unlearningMode": "certified", "dpEnabled": false,
                     "epsilon": 8.0, "retentionDays": 30, "auditLog": true}
        }),
    )
    .await;

    wait_complete(&app, &job_id).await;

    let results = json_body(send(&app, get(&format!("/api/results?job_id={}", job_id))).await).await;
    assert_eq!(results["dataset_name"], "CIFAR-10");
    assert_eq!(results["summary"]["before_records"], 6600);
    assert_eq!(results["summary"]["after_records"], 6000);
    assert_eq!(results["summary"]["removed"], 600);
    assert_eq!(results["download"], format!("/api/download/{}", job_id));
    assert_eq!(results["sample_pairs"].as_array().unwrap().len(), 3);

    let download = send(&app, get(&format!("/api/download/{}", job_id))).await;
    assert_eq!(download.status(), StatusCode::OK);
    assert_eq!(download.headers()[header::CONTENT_TYPE], "text/csv");
    assert!(text(download).await.starts_with("data_subject_id,"));

    // Job counted as an unlearning request
    let kpis = json_body(send(&app, get("/api/kpis")).await).await;
    assert_eq!(kpis["unlearning_requests"], 1);
    assert_eq!(kpis["model_accuracy"], 91.8);
    assert_eq!(kpis["privacy_score"], 92.0);

    let nodes = json_body(send(&app, get("/api/nodes")).await).await;
    assert_eq!(nodes["items"][0]["duplicate_ratio"], 0.2);
    assert_eq!(nodes["items"][7]["duplicate_ratio"], 0.0);
}

#[tokio::test]
async fn test_run_rejects_invalid_config() {
    let app = app(1);

    let ratio = send(&app, post_json("/api/run", json!({"attack": {"duplicateRatio": 95}}))).await;
    assert_eq!(ratio.status(), StatusCode::BAD_REQUEST);

    let subject = send(
        &app,
        post_json("/api/run", json!({"gdpr": {"unlearningMode": "hard_delete", "subjectId": " "}})),
    )
    .await;
    assert_eq!(subject.status(), StatusCode::BAD_REQUEST);

    let dataset = send(&app, post_json("/api/run", json!({"dataset": "unknown"}))).await;
    assert_eq!(dataset.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_results_not_ready_or_unknown() {
    let app = app(10_000);
    let job_id = start_run(&app, json!({})).await;

    let pending = send(&app, get(&format!("/api/results?job_id={}", job_id))).await;
    assert_eq!(pending.status(), StatusCode::NOT_FOUND);

    let poll = text(send(&app, get(&format!("/api/progress?job_id={}&mode=poll", job_id))).await).await;
    assert!(poll == "0%" || poll == "5%", "unexpected progress {}", poll);

    let unknown = send(&app, get("/api/results?job_id=not-a-job")).await;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

    let download = send(&app, get(&format!("/api/download/{}", job_id))).await;
    assert_eq!(download.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_progress_stream_events() {
    let app = app(2);
    let job_id = start_run(&app, json!({})).await;

    let request = Request::get(format!("/api/progress?job_id={}", job_id))
        .header(header::ACCEPT, "text/event-stream")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/event-stream");

    let body = text(response).await;
    assert!(body.contains("event: progress\ndata: 100\n"));
    assert!(body.trim_end().ends_with("event: complete\ndata: done"));
}

#[tokio::test]
async fn test_progress_stream_unknown_job() {
    let app = app(1);
    let request = Request::get("/api/progress?job_id=missing")
        .header(header::ACCEPT, "text/event-stream")
        .body(Body::empty())
        .unwrap();

    let body = text(send(&app, request).await).await;
    assert!(body.contains("event: error"));

    let poll = send(&app, get("/api/progress?job_id=missing")).await;
    assert_eq!(poll.status(), StatusCode::NOT_FOUND);
}

fn multipart(file_name: &str, contents: &str) -> Request<Body> {
    let boundary = "XBOUNDARYX";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\n\
         Content-Type: text/csv\r\n\r\n{c}\r\n--{b}--\r\n",
        b = boundary,
        f = file_name,
        c = contents
    );

    Request::post("/api/upload")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary))
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_upload_dataset() {
    let app = app(1);

    let ok = send(&app, multipart("subjects.csv", "data_subject_id,text\n1,a\n2,b\n3,c")).await;
    assert_eq!(ok.status(), StatusCode::OK);
    let body = json_body(ok).await;
    assert_eq!(body["dataset"], "upload:subjects.csv");
    assert_eq!(body["kpis"]["total_data_points"], 3);

    let bad = send(&app, multipart("plain.csv", "id,text\n1,a")).await;
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
}
