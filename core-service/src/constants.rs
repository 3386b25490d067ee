//! Central Configuration Constants
//!
//! Single source of truth for all dashboard defaults.
//! To point the dashboard at another backend, only edit this file or set
//! the matching environment variable.

use std::path::PathBuf;
use std::time::Duration;

/// Default backend URL
///
/// This is the fallback URL when no environment variable is set.
/// For development: http://localhost:8000
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Poll interval used after the progress stream fails (milliseconds)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 600;

/// A job whose progress does not move for this long is failed (seconds)
pub const DEFAULT_STALL_TIMEOUT_SECS: u64 = 15 * 60;

/// HTTP request timeout (seconds). Does not apply to the progress stream.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Number of completed runs kept in the local history
pub const HISTORY_LIMIT: usize = 10;

/// Header the backend may use to return the job id
pub const JOB_ID_HEADER: &str = "x-job-id";

/// Placeholder login (replace the authenticator for real deployments)
pub const DEFAULT_USERNAME: &str = "admin";
pub const DEFAULT_PASSWORD: &str = "unlearn";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "Federated Unlearning Dashboard";

const APP_DIR_NAME: &str = "federated-unlearning";
const HISTORY_FILE_NAME: &str = "history.json";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Get backend URL from environment or use default
pub fn get_api_url() -> String {
    std::env::var("DASHBOARD_API_URL")
        .unwrap_or_else(|_| DEFAULT_API_URL.to_string())
}

/// Get poll interval from environment or use default
pub fn get_poll_interval() -> Duration {
    let ms = std::env::var("DASHBOARD_POLL_INTERVAL_MS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_POLL_INTERVAL_MS);
    Duration::from_millis(ms.max(1))
}

/// Get stall timeout from environment or use default. `0` disables it.
pub fn get_stall_timeout() -> Option<Duration> {
    let secs = std::env::var("DASHBOARD_STALL_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_STALL_TIMEOUT_SECS);
    (secs > 0).then(|| Duration::from_secs(secs))
}

/// Get HTTP request timeout from environment or use default
pub fn get_request_timeout() -> Duration {
    let secs = std::env::var("DASHBOARD_REQUEST_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
    Duration::from_secs(secs)
}

/// Get history file path from environment or the platform data dir
pub fn get_history_path() -> PathBuf {
    if let Ok(path) = std::env::var("DASHBOARD_HISTORY_FILE") {
        return PathBuf::from(path);
    }

    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
        .join(HISTORY_FILE_NAME)
}

/// Get the expected login username from environment or use default
pub fn get_login_username() -> String {
    std::env::var("DASHBOARD_USERNAME")
        .unwrap_or_else(|_| DEFAULT_USERNAME.to_string())
}

/// Get the expected login password from environment or use default
pub fn get_login_password() -> String {
    std::env::var("DASHBOARD_PASSWORD")
        .unwrap_or_else(|_| DEFAULT_PASSWORD.to_string())
}
