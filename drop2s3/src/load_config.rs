/// `load_config` module: reads the optional YAML config file and resolves it into the
/// values a [`SessionConfig`] needs.
///
/// Every key is optional. Missing directories fall back to the usual locations under the
/// home directory, missing extension lists and device rules fall back to the core
/// defaults, and the `remote` section can be overridden from the environment:
///
/// | variable                | overrides              |
/// |-------------------------|------------------------|
/// | `DROP2S3_S3_ENDPOINT`   | `remote.endpoint_url`  |
/// | `DROP2S3_S3_REGION`     | `remote.region`        |
/// | `DROP2S3_EMULATE_ROOT`  | `remote.emulate_root`  |
///
/// # Errors
/// All errors here are `anyhow::Error` and surface at the CLI boundary.
use anyhow::{anyhow, Result};
use drop2s3_core::config::{IntegrityPolicy, SessionConfig};
use drop2s3_core::extension::ExtensionClassifier;
use drop2s3_core::partition::{DeviceRule, PartitionKey};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub const ENV_S3_ENDPOINT: &str = "DROP2S3_S3_ENDPOINT";
pub const ENV_S3_REGION: &str = "DROP2S3_S3_REGION";
pub const ENV_EMULATE_ROOT: &str = "DROP2S3_EMULATE_ROOT";

const DEFAULT_INBOX: &str = "Dropbox/Camera Uploads";
const DEFAULT_STAGING_BASE: &str = "Pictures/s3";

#[derive(Debug, Default, Deserialize)]
pub struct CliConfig {
    pub bucket_name: Option<String>,
    pub inbox_dir: Option<PathBuf>,
    pub staging_base: Option<PathBuf>,
    pub extensions: Option<ExtensionsSection>,
    pub device_rules: Option<Vec<DeviceRule>>,
    #[serde(default)]
    pub on_integrity_mismatch: IntegrityPolicy,
    #[serde(default)]
    pub remote: RemoteSection,
}

#[derive(Debug, Deserialize)]
pub struct ExtensionsSection {
    #[serde(default)]
    pub image: Vec<String>,
    #[serde(default)]
    pub video: Vec<String>,
}

/// Where the bucket lives. With `emulate_root` set, the bucket is a directory
/// `emulate_root/{bucket_name}` and S3 is never contacted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RemoteSection {
    pub endpoint_url: Option<String>,
    pub region: Option<String>,
    pub emulate_root: Option<PathBuf>,
}

impl CliConfig {
    /// Overwrites the `remote` section with any `DROP2S3_*` variables that are set.
    pub fn apply_env_overrides(&mut self) {
        if let Some(endpoint) = non_empty_env(ENV_S3_ENDPOINT) {
            info!(endpoint = %endpoint, "Using S3 endpoint from environment");
            self.remote.endpoint_url = Some(endpoint);
        }
        if let Some(region) = non_empty_env(ENV_S3_REGION) {
            info!(region = %region, "Using S3 region from environment");
            self.remote.region = Some(region);
        }
        if let Some(root) = non_empty_env(ENV_EMULATE_ROOT) {
            info!(emulate_root = %root, "Emulating the bucket on the local filesystem");
            self.remote.emulate_root = Some(PathBuf::from(root));
        }
    }

    pub fn inbox_dir(&self) -> Result<PathBuf> {
        match &self.inbox_dir {
            Some(dir) => Ok(dir.clone()),
            None => home_relative(DEFAULT_INBOX),
        }
    }

    pub fn staging_base(&self) -> Result<PathBuf> {
        match &self.staging_base {
            Some(dir) => Ok(dir.clone()),
            None => home_relative(DEFAULT_STAGING_BASE),
        }
    }

    pub fn classifier(&self) -> ExtensionClassifier {
        match &self.extensions {
            Some(ext) => ExtensionClassifier::new(ext.image.iter(), ext.video.iter()),
            None => ExtensionClassifier::default(),
        }
    }

    pub fn device_rules(&self) -> Vec<DeviceRule> {
        self.device_rules.clone().unwrap_or_else(DeviceRule::defaults)
    }

    /// Builds the session config for one bucket and partition.
    /// Staging for the run is `staging_base/{bucket}/photos/{year}/{month}/{device}/`.
    pub fn session_config(&self, bucket: &str, partition: PartitionKey) -> Result<SessionConfig> {
        let staging_root = self
            .staging_base()?
            .join(bucket)
            .join(partition.remote_prefix());
        Ok(SessionConfig::new(partition, self.inbox_dir()?, staging_root)
            .with_classifier(self.classifier())
            .with_device_rules(self.device_rules())
            .with_integrity_policy(self.on_integrity_mismatch))
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn home_relative(rel: &str) -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(rel))
        .ok_or_else(|| anyhow!("Could not determine the home directory; set it explicitly in the config"))
}

/// Loads a YAML config file. An empty file yields the defaults.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow!("Failed to read config file {:?}: {}", path_ref, e));
        }
    };

    if config_content.trim().is_empty() {
        info!(config_path = ?path_ref, "Config file is empty; using defaults");
        return Ok(CliConfig::default());
    }

    match serde_yaml::from_str::<CliConfig>(&config_content) {
        Ok(conf) => {
            info!(
                config_path = ?path_ref,
                bucket = ?conf.bucket_name,
                policy = ?conf.on_integrity_mismatch,
                "Parsed config YAML successfully"
            );
            Ok(conf)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            Err(anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}
