//! Partition keys, remote key layout and the filename predicate that scopes a run.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::ReconcileError;
use crate::extension::ExtensionClassifier;

/// (year, month, device): the scope of one reconciliation run. Only [`PartitionKey::new`]
/// builds one, so every key in circulation is valid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PartitionKey {
    year: String,
    month: String,
    device: String,
}

impl PartitionKey {
    pub fn new(
        year: impl Into<String>,
        month: impl Into<String>,
        device: impl Into<String>,
    ) -> Result<Self, ReconcileError> {
        let (year, month, device) = (year.into(), month.into(), device.into());
        if year.len() != 4 || !year.chars().all(|c| c.is_ascii_digit()) {
            return Err(ReconcileError::InvalidPartition(format!(
                "year must be four digits, got '{year}'"
            )));
        }
        let month_ok = month.len() == 2
            && month.chars().all(|c| c.is_ascii_digit())
            && matches!(month.parse::<u8>(), Ok(1..=12));
        if !month_ok {
            return Err(ReconcileError::InvalidPartition(format!(
                "month must be two digits between 01 and 12, got '{month}'"
            )));
        }
        if device.is_empty() || device.contains('/') {
            return Err(ReconcileError::InvalidPartition(format!(
                "device must be non-empty and contain no '/', got '{device}'"
            )));
        }
        Ok(Self {
            year,
            month,
            device,
        })
    }

    pub fn year(&self) -> &str {
        &self.year
    }

    pub fn month(&self) -> &str {
        &self.month
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    /// Object-store prefix for this partition, always ending in `/`.
    pub fn remote_prefix(&self) -> String {
        format!("photos/{}/{}/{}/", self.year, self.month, self.device)
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}/{}", self.year, self.month, self.device)
    }
}

/// Builds `photos/{year}/{month}/{device}/[video/]{filename}` keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteLayout {
    prefix: String,
}

impl RemoteLayout {
    pub fn for_partition(partition: &PartitionKey) -> Self {
        Self {
            prefix: partition.remote_prefix(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn key_for(&self, classifier: &ExtensionClassifier, filename: &str) -> String {
        format!("{}{}", self.prefix, classifier.key_suffix(filename))
    }
}

/// A device whose files are recognised by an infix token instead of a date prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRule {
    pub device: String,
    pub infix: String,
}

impl DeviceRule {
    pub fn defaults() -> Vec<DeviceRule> {
        vec![DeviceRule {
            device: "NikonCoolpix".to_string(),
            infix: "DSCN".to_string(),
        }]
    }
}

/// Which filenames belong to a partition. Extension filtering happens separately in the
/// [`ExtensionClassifier`], so both variants are case-insensitive on extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilenameMatcher {
    /// `{year}-{month}-...`, the camera-upload naming scheme.
    DatePrefix { prefix: String },
    /// Any name containing the token, e.g. `DSCN` for Nikon Coolpix files.
    Infix { token: String },
}

impl FilenameMatcher {
    /// Picks the infix rule when the partition's device has one, the date prefix otherwise.
    pub fn select(partition: &PartitionKey, rules: &[DeviceRule]) -> Self {
        match rules.iter().find(|r| r.device == partition.device()) {
            Some(rule) => FilenameMatcher::Infix {
                token: rule.infix.clone(),
            },
            None => FilenameMatcher::DatePrefix {
                prefix: format!("{}-{}-", partition.year(), partition.month()),
            },
        }
    }

    pub fn matches(&self, filename: &str) -> bool {
        match self {
            FilenameMatcher::DatePrefix { prefix } => filename.starts_with(prefix.as_str()),
            FilenameMatcher::Infix { token } => filename.contains(token.as_str()),
        }
    }
}

/// A (year, month) pair found in the inbox.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct YearMonth {
    pub year: String,
    pub month: String,
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.year, self.month)
    }
}

/// Sorted, de-duplicated (year, month) pairs of every `YYYY-MM-DD*` file directly in `inbox`.
/// A missing inbox yields an empty list.
pub fn detect_partitions(inbox: &Path) -> Result<Vec<YearMonth>, ReconcileError> {
    if !inbox.exists() {
        tracing::warn!(path = %inbox.display(), "[DETECT] Inbox directory not found");
        return Ok(Vec::new());
    }
    let date_pattern = Regex::new(r"^(\d{4})-(\d{2})-\d{2}").expect("static regex is valid");

    let mut found = BTreeSet::new();
    for entry in WalkDir::new(inbox).max_depth(1) {
        let entry = entry.map_err(|source| ReconcileError::Scan {
            root: inbox.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if let Some(caps) = date_pattern.captures(&name) {
            found.insert(YearMonth {
                year: caps[1].to_string(),
                month: caps[2].to_string(),
            });
        }
    }
    tracing::info!(count = found.len(), "[DETECT] Detected year/month combinations");
    Ok(found.into_iter().collect())
}
