//! Data models

pub mod dataset;
pub mod job;
pub mod run;
pub mod dashboard;

pub use dataset::*;
pub use job::*;
pub use run::*;
pub use dashboard::*;
