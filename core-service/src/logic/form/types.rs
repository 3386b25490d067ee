use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::validate::ConfigError;

// ============================================================================
// DATASETS
// ============================================================================

pub const DEFAULT_DATASET: &str = "CIFAR-10";

/// Datasets offered by the selector. The backend may know more.
pub const DATASETS: &[&str] = &[
    "MNIST",
    "CIFAR-10",
    "CIFAR-100",
    "FAKER-NAMES",
    "20NEWS",
    "Phishing-URLs",
    "Windows-EventLog",
    "NSL-KDD sample",
];

// ============================================================================
// OPTION ENUMS
// ============================================================================

/// Attack type. Only `Duplication` changes the simulated run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackType {
    #[default]
    Duplication,
    LabelPoison,
    Backdoor,
}

impl AttackType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Duplication => "duplication",
            Self::LabelPoison => "label_poison",
            Self::Backdoor => "backdoor",
        }
    }

    /// Placeholder types are sent as-is but have no effect yet
    pub fn is_functional(&self) -> bool {
        matches!(self, Self::Duplication)
    }
}

/// How injected duplicates are spread over clients and classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicationStrategy {
    #[default]
    Random,
    ClassSkewed,
    ByClient,
    ByClass,
    ClientSkewed,
    Burst,
}

impl DuplicationStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::ClassSkewed => "class_skewed",
            Self::ByClient => "by_client",
            Self::ByClass => "by_class",
            Self::ClientSkewed => "client_skewed",
            Self::Burst => "burst",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlearningMode {
    #[default]
    Certified,
    HardDelete,
}

impl UnlearningMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Certified => "certified",
            Self::HardDelete => "hard_delete",
        }
    }
}

macro_rules! impl_option_text {
    ($ty:ident, $field:literal, [$($variant:ident),+]) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ConfigError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
                $(
                    if wanted == $ty::$variant.as_str() {
                        return Ok($ty::$variant);
                    }
                )+
                Err(ConfigError::UnknownOption {
                    field: $field,
                    value: s.to_string(),
                })
            }
        }
    };
}

impl_option_text!(AttackType, "attack type", [Duplication, LabelPoison, Backdoor]);
impl_option_text!(
    DuplicationStrategy,
    "strategy",
    [Random, ClassSkewed, ByClient, ByClass, ClientSkewed, Burst]
);
impl_option_text!(UnlearningMode, "unlearning mode", [Certified, HardDelete]);

// ============================================================================
// CONFIG OBJECTS
// ============================================================================

/// Attack parameters (percentages are whole numbers)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackConfig {
    #[serde(rename = "type")]
    pub attack_type: AttackType,
    /// Share of injected duplicates, 0..=90
    pub duplicate_ratio: u32,
    pub strategy: DuplicationStrategy,
    /// `auto` or a class name / digit
    pub target_class: String,
    /// Share of clients affected, 1..=100
    pub clients_affected: u32,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            attack_type: AttackType::Duplication,
            duplicate_ratio: 10,
            strategy: DuplicationStrategy::Random,
            target_class: "auto".to_string(),
            clients_affected: 50,
        }
    }
}

/// GDPR / unlearning parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GdprConfig {
    /// Data subject the request is about (required for hard delete)
    pub subject_id: String,
    pub unlearning_mode: UnlearningMode,
    pub dp_enabled: bool,
    /// Privacy budget, only meaningful with `dp_enabled`
    pub epsilon: f64,
    /// Auto-delete after N days, 0..=365
    pub retention_days: u32,
    pub audit_log: bool,
}

impl Default for GdprConfig {
    fn default() -> Self {
        Self {
            subject_id: String::new(),
            unlearning_mode: UnlearningMode::Certified,
            dp_enabled: false,
            epsilon: 8.0,
            retention_days: 30,
            audit_log: true,
        }
    }
}

/// Complete run request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub dataset: String,
    pub attack: AttackConfig,
    pub gdpr: GdprConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            dataset: DEFAULT_DATASET.to_string(),
            attack: AttackConfig::default(),
            gdpr: GdprConfig::default(),
        }
    }
}

impl RunConfig {
    pub fn with_dataset(mut self, dataset: impl Into<String>) -> Self {
        self.dataset = dataset.into();
        self
    }

    pub fn is_valid(&self) -> bool {
        super::validate_run_config(self).is_ok()
    }
}
