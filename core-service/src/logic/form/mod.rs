//! Configuration Form
//!
//! Holds the three configuration sub-objects sent with every run:
//! dataset selection, attack parameters and GDPR parameters.
//!
//! # Architecture
//! - `types.rs`: `RunConfig`, `AttackConfig`, `GdprConfig` and their option enums
//! - `validate.rs`: Range and cross-field checks run before submission
//!
//! No network I/O happens here. Dataset side effects (select endpoint,
//! overview refresh) are driven by the dashboard controller.

pub mod types;
pub mod validate;

pub use types::{
    AttackConfig, AttackType, DuplicationStrategy, GdprConfig, RunConfig, UnlearningMode,
    DATASETS, DEFAULT_DATASET,
};
pub use validate::{validate_run_config, ConfigError};

const CIFAR_CLASSES: [&str; 10] = [
    "airplane", "car", "bird", "cat", "deer", "dog", "frog", "horse", "ship", "truck",
];

/// Target class options for a dataset. Always starts with `auto`.
pub fn target_classes(dataset: &str) -> Vec<String> {
    let mut classes = vec!["auto".to_string()];

    if dataset.eq_ignore_ascii_case("MNIST") {
        classes.extend((0..10).map(|d| d.to_string()));
    } else if dataset.to_ascii_uppercase().starts_with("CIFAR") {
        classes.extend(CIFAR_CLASSES.iter().map(|c| c.to_string()));
    }

    classes
}
