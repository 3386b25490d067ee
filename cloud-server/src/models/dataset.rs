//! Dataset catalogue

use serde::{Deserialize, Serialize};

/// Federated regions, one client node each
pub const REGIONS: [&str; 8] = [
    "Victoria",
    "New South Wales",
    "Queensland",
    "Tasmania",
    "South Australia",
    "Western Australia",
    "Northern Territory",
    "ACT",
];

/// Regions whose nodes report as active
pub const ACTIVE_REGIONS: [&str; 4] = ["Victoria", "New South Wales", "Queensland", "Northern Territory"];

/// Built-in datasets and their record counts
pub const CATALOGUE: [(&str, u64); 8] = [
    ("MNIST", 7_000),
    ("CIFAR-10", 6_000),
    ("CIFAR-100", 6_000),
    ("FAKER-NAMES", 1_200),
    ("20NEWS", 2_000),
    ("Phishing-URLs", 8_000),
    ("Windows-EventLog", 5_000),
    ("NSL-KDD sample", 4_000),
];

pub const DEFAULT_DATASET: &str = "CIFAR-10";

/// Column every uploaded CSV must carry
pub const SUBJECT_ID_COLUMN: &str = "data_subject_id";

/// Dataset currently loaded on the backend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveDataset {
    pub name: String,
    pub records: u64,
}

impl ActiveDataset {
    pub fn from_catalogue(name: &str) -> Option<Self> {
        CATALOGUE
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(name))
            .map(|(known, records)| Self {
                name: known.to_string(),
                records: *records,
            })
    }

    /// Parse an uploaded CSV: header must name the subject id column
    pub fn from_upload(file_name: &str, contents: &[u8]) -> Result<Self, String> {
        let text = String::from_utf8_lossy(contents);
        let mut lines = text.lines().filter(|l| !l.trim().is_empty());

        let header = lines.next().ok_or_else(|| "uploaded file is empty".to_string())?;
        let has_subject = header
            .trim_start_matches('\u{feff}')
            .split(',')
            .any(|c| c.trim().trim_matches('"').eq_ignore_ascii_case(SUBJECT_ID_COLUMN));
        if !has_subject {
            return Err(format!("CSV header has no {} column", SUBJECT_ID_COLUMN));
        }

        Ok(Self {
            name: format!("upload:{}", file_name),
            records: lines.count() as u64,
        })
    }
}

impl Default for ActiveDataset {
    fn default() -> Self {
        Self {
            name: DEFAULT_DATASET.to_string(),
            records: 6_000,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DatasetList {
    pub items: Vec<String>,
}

impl DatasetList {
    pub fn catalogue() -> Self {
        Self {
            items: CATALOGUE.iter().map(|(name, _)| name.to_string()).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SelectDataset {
    pub name: String,
}
