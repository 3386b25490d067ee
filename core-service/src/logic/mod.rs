//! Logic Module - Dashboard business logic
//!
//! ## Architecture
//! - `form/` - Run configuration and validation
//! - `backend/` - `Backend` seam and the HTTP client
//! - `progress/` - Stream/poll progress observation
//! - `results/` - Results document and summary
//! - `history/` - Capped local run history
//! - `state/` - Explicit state and reducer
//! - `dashboard/` - Controller driving the reducer

pub mod auth;
pub mod backend;
pub mod dashboard;
pub mod form;
pub mod history;
pub mod overview;
pub mod progress;
pub mod results;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;
