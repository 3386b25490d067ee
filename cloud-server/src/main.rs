//! Federated Unlearning Demo Backend
//!
//! Serves the dashboard API with simulated unlearning jobs.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  UNLEARNING DEMO BACKEND                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌───────────────┐  ┌─────────────────────┐ │
//! │  │  API      │  │  Progress     │  │  Job Engine         │ │
//! │  │  Gateway  │  │  SSE / Poll   │  │  (tokio tasks)      │ │
//! │  │  (Axum)   │  │               │  │                     │ │
//! │  └─────┬─────┘  └───────┬───────┘  └──────────┬──────────┘ │
//! │        └────────────────┼─────────────────────┘            │
//! │                         ▼                                   │
//! │                ┌─────────────────┐                         │
//! │                │ In-memory store │                         │
//! │                └─────────────────┘                         │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod engine;
mod error;
mod handlers;
mod models;
mod store;
#[cfg(test)]
mod tests;

use axum::{
    Router,
    http::HeaderName,
    routing::{get, post},
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use std::net::SocketAddr;
use std::sync::Arc;

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "unlearning_backend=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    tracing::info!("Unlearning demo backend starting...");
    tracing::info!("Environment: {} (job step {} ms)", config.environment, config.job_step_ms);
    if !config.is_production() {
        tracing::warn!("Development mode: jobs are simulated and kept in memory only");
    }

    // Build application state
    let state = AppState {
        store: Arc::new(store::AppStore::new()),
        config: config.clone(),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<store::AppStore>,
    pub config: config::Config,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/api/health", get(handlers::health::check))

        // Overview
        .route("/api/kpis", get(handlers::dashboard::kpis))
        .route("/api/nodes", get(handlers::dashboard::nodes))

        // Datasets
        .route("/api/datasets", get(handlers::datasets::list))
        .route("/api/datasets/select", post(handlers::datasets::select))
        .route("/api/upload", post(handlers::datasets::upload))

        // Jobs
        .route("/api/run", post(handlers::jobs::run))
        .route("/api/progress", get(handlers::jobs::progress))
        .route("/api/results", get(handlers::jobs::results))
        .route("/api/download/:job_id", get(handlers::jobs::download));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        // The dashboard reads the job id from this header
        .expose_headers([HeaderName::from_static(handlers::jobs::JOB_ID_HEADER)]);

    api_routes
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
