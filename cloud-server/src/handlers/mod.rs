//! HTTP handlers

pub mod health;
pub mod datasets;
pub mod dashboard;
pub mod jobs;
