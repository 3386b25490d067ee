//! Run request model

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Body of `POST /api/run`. Missing fields take the dashboard defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RunRequest {
    /// Falls back to the selected dataset
    pub dataset: Option<String>,

    #[validate(nested)]
    pub attack: AttackParams,

    #[validate(nested)]
    pub gdpr: GdprParams,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct AttackParams {
    #[serde(rename = "type")]
    pub attack_type: String,

    #[validate(range(max = 90))]
    pub duplicate_ratio: u32,

    pub strategy: String,

    pub target_class: String,

    #[validate(range(min = 1, max = 100))]
    pub clients_affected: u32,
}

impl Default for AttackParams {
    fn default() -> Self {
        Self {
            attack_type: "duplication".to_string(),
            duplicate_ratio: 10,
            strategy: "random".to_string(),
            target_class: "auto".to_string(),
            clients_affected: 50,
        }
    }
}

impl AttackParams {
    pub fn injects_duplicates(&self) -> bool {
        self.attack_type == "duplication"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
#[validate(schema(function = "validate_subject"))]
pub struct GdprParams {
    pub subject_id: String,

    pub unlearning_mode: String,

    pub dp_enabled: bool,

    #[validate(range(exclusive_min = 0.0))]
    pub epsilon: f64,

    #[validate(range(max = 365))]
    pub retention_days: u32,

    pub audit_log: bool,
}

impl Default for GdprParams {
    fn default() -> Self {
        Self {
            subject_id: String::new(),
            unlearning_mode: "certified".to_string(),
            dp_enabled: false,
            epsilon: 8.0,
            retention_days: 30,
            audit_log: true,
        }
    }
}

fn validate_subject(gdpr: &GdprParams) -> Result<(), ValidationError> {
    if gdpr.unlearning_mode == "hard_delete" && gdpr.subject_id.trim().is_empty() {
        return Err(ValidationError::new("subject_id_required"));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct RunAccepted {
    pub job_id: String,
    pub status: &'static str,
}
