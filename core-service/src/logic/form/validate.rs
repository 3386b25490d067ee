use super::types::{AttackConfig, GdprConfig, RunConfig, UnlearningMode};

pub const MAX_DUPLICATE_RATIO: u32 = 90;
pub const MIN_CLIENTS_AFFECTED: u32 = 1;
pub const MAX_CLIENTS_AFFECTED: u32 = 100;
pub const MAX_RETENTION_DAYS: u32 = 365;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("dataset must be selected")]
    EmptyDataset,

    #[error("duplicate ratio must be between 0 and 90%, got {0}%")]
    DuplicateRatioOutOfRange(u32),

    #[error("clients affected must be between 1 and 100%, got {0}%")]
    ClientsAffectedOutOfRange(u32),

    #[error("retention must be between 0 and 365 days, got {0}")]
    RetentionOutOfRange(u32),

    #[error("DP epsilon must be a positive number, got {0}")]
    InvalidEpsilon(f64),

    #[error("hard delete requires a data subject ID")]
    SubjectIdRequired,

    #[error("unknown {field} option: {value}")]
    UnknownOption { field: &'static str, value: String },
}

/// Validate a run configuration before submission.
/// Returns the first violation found.
pub fn validate_run_config(config: &RunConfig) -> Result<(), ConfigError> {
    if config.dataset.trim().is_empty() {
        return Err(ConfigError::EmptyDataset);
    }
    validate_attack(&config.attack)?;
    validate_gdpr(&config.gdpr)
}

pub fn validate_attack(attack: &AttackConfig) -> Result<(), ConfigError> {
    if attack.duplicate_ratio > MAX_DUPLICATE_RATIO {
        return Err(ConfigError::DuplicateRatioOutOfRange(attack.duplicate_ratio));
    }
    if !(MIN_CLIENTS_AFFECTED..=MAX_CLIENTS_AFFECTED).contains(&attack.clients_affected) {
        return Err(ConfigError::ClientsAffectedOutOfRange(attack.clients_affected));
    }
    Ok(())
}

pub fn validate_gdpr(gdpr: &GdprConfig) -> Result<(), ConfigError> {
    if gdpr.retention_days > MAX_RETENTION_DAYS {
        return Err(ConfigError::RetentionOutOfRange(gdpr.retention_days));
    }
    if !gdpr.epsilon.is_finite() || gdpr.epsilon <= 0.0 {
        return Err(ConfigError::InvalidEpsilon(gdpr.epsilon));
    }
    if gdpr.unlearning_mode == UnlearningMode::HardDelete && gdpr.subject_id.trim().is_empty() {
        return Err(ConfigError::SubjectIdRequired);
    }
    Ok(())
}
