//! Federated Unlearning Dashboard - Core Service
//!
//! Client side of the unlearning dashboard: configuration form, run
//! initiation, progress observation, results and local run history.

pub mod constants;
pub mod logic;

pub use logic::backend::{ApiConfig, ApiError, Backend, DashboardClient, JobId};
pub use logic::dashboard::Dashboard;
pub use logic::state::{DashboardState, RunPhase};
