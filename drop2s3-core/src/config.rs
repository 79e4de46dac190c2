use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::extension::ExtensionClassifier;
use crate::partition::{DeviceRule, PartitionKey};

/// What delete-from-inbox does when an inbox file and its staging copy differ.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegrityPolicy {
    /// Stop the whole pass at the first mismatch.
    #[default]
    Abort,
    /// Flag the file, keep it, and continue with the rest.
    Skip,
}

/// Everything a session needs, with the partition's directories already resolved.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub partition: PartitionKey,
    pub inbox_root: PathBuf,
    /// Staging directory *for this partition*, i.e. the local mirror of the remote prefix.
    pub staging_root: PathBuf,
    pub classifier: ExtensionClassifier,
    pub device_rules: Vec<DeviceRule>,
    pub integrity_policy: IntegrityPolicy,
}

impl SessionConfig {
    pub fn new(
        partition: PartitionKey,
        inbox_root: impl Into<PathBuf>,
        staging_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            partition,
            inbox_root: inbox_root.into(),
            staging_root: staging_root.into(),
            classifier: ExtensionClassifier::default(),
            device_rules: DeviceRule::defaults(),
            integrity_policy: IntegrityPolicy::default(),
        }
    }

    pub fn with_classifier(mut self, classifier: ExtensionClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_device_rules(mut self, rules: Vec<DeviceRule>) -> Self {
        self.device_rules = rules;
        self
    }

    pub fn with_integrity_policy(mut self, policy: IntegrityPolicy) -> Self {
        self.integrity_policy = policy;
        self
    }

    pub fn trace_loaded(&self) {
        info!(
            partition = %self.partition,
            inbox = %self.inbox_root.display(),
            staging = %self.staging_root.display(),
            policy = ?self.integrity_policy,
            "Loaded session config"
        );
        debug!(?self, "Session config (full debug)");
    }
}
