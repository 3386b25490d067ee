//! Configuration module

use std::env;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Delay between simulated job stages (milliseconds)
    pub job_step_ms: u64,

    /// Path prefix of the cleaned artifact download
    pub results_base_path: String,

    /// Environment (development, production)
    pub environment: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8000,
            job_step_ms: 150,
            results_base_path: "/api/download".to_string(),
            environment: "development".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),

            job_step_ms: env::var("JOB_STEP_MS")
                .ok()
                .and_then(|ms| ms.parse().ok())
                .unwrap_or(defaults.job_step_ms),

            results_base_path: env::var("RESULTS_BASE_PATH")
                .map(|p| p.trim_end_matches('/').to_string())
                .unwrap_or(defaults.results_base_path),

            environment: env::var("ENVIRONMENT")
                .unwrap_or(defaults.environment),
        }
    }

    pub fn job_step(&self) -> Duration {
        Duration::from_millis(self.job_step_ms)
    }

    /// How often a progress stream checks for changes
    pub fn stream_tick(&self) -> Duration {
        Duration::from_millis(self.job_step_ms.clamp(10, 250))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
