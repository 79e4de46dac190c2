//! The per-run reconciliation session.
//!
//! A [`ReconcileSession`] is built by scanning all three locations and is immutable
//! afterwards. Anything that changes the filesystem or the bucket invalidates it; call
//! [`ReconcileSession::rescan`] to get a fresh one rather than patching the table.

use std::path::{Path, PathBuf};

use crate::config::{IntegrityPolicy, SessionConfig};
use crate::contract::ObjectStore;
use crate::error::ReconcileError;
use crate::extension::ExtensionClassifier;
use crate::partition::{FilenameMatcher, PartitionKey, RemoteLayout};
use crate::scan::{scan_directory, scan_remote, scan_top_level, ScanFilter};
use crate::store::{Location, ReconciliationStore};

#[derive(Debug, Clone)]
pub struct ReconcileSession {
    config: SessionConfig,
    filter: ScanFilter,
    layout: RemoteLayout,
    store: ReconciliationStore,
}

impl ReconcileSession {
    /// Scans inbox, staging and remote concurrently, then fills a fresh store.
    pub async fn build<S>(config: SessionConfig, remote: &S) -> Result<Self, ReconcileError>
    where
        S: ObjectStore + ?Sized,
    {
        config.trace_loaded();
        let filter = ScanFilter {
            classifier: config.classifier.clone(),
            matcher: FilenameMatcher::select(&config.partition, &config.device_rules),
        };
        let layout = RemoteLayout::for_partition(&config.partition);
        tracing::info!(matcher = ?filter.matcher, prefix = layout.prefix(), "[SCAN] Starting scans");

        let (inbox, staging, remote_names) = futures::try_join!(
            scan_blocking(config.inbox_root.clone(), filter.clone(), scan_top_level),
            scan_blocking(config.staging_root.clone(), filter.clone(), scan_directory),
            scan_remote(remote, layout.prefix(), &filter),
        )?;

        let mut store = ReconciliationStore::new();
        for name in &inbox {
            store.upsert_presence(name, Location::Inbox);
        }
        for name in &staging {
            store.upsert_presence(name, Location::Staging);
        }
        for name in &remote_names {
            store.upsert_presence(name, Location::Remote);
        }
        tracing::info!(
            inbox = inbox.len(),
            staging = staging.len(),
            remote = remote_names.len(),
            records = store.len(),
            "[SCAN] Reconciliation table built"
        );

        Ok(Self {
            config,
            filter,
            layout,
            store,
        })
    }

    /// Full rebuild from the same configuration.
    pub async fn rescan<S>(&self, remote: &S) -> Result<Self, ReconcileError>
    where
        S: ObjectStore + ?Sized,
    {
        tracing::info!(partition = %self.config.partition, "[SCAN] Re-scanning all locations");
        Self::build(self.config.clone(), remote).await
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn partition(&self) -> &PartitionKey {
        &self.config.partition
    }

    pub fn inbox_root(&self) -> &Path {
        &self.config.inbox_root
    }

    pub fn staging_root(&self) -> &Path {
        &self.config.staging_root
    }

    pub fn integrity_policy(&self) -> IntegrityPolicy {
        self.config.integrity_policy
    }

    pub fn classifier(&self) -> &ExtensionClassifier {
        &self.filter.classifier
    }

    pub fn matcher(&self) -> &FilenameMatcher {
        &self.filter.matcher
    }

    pub fn layout(&self) -> &RemoteLayout {
        &self.layout
    }

    pub fn store(&self) -> &ReconciliationStore {
        &self.store
    }

    /// Inbox files live directly below the inbox root; the inbox scan does not descend.
    pub fn inbox_path(&self, filename: &str) -> PathBuf {
        self.config.inbox_root.join(filename)
    }

    pub fn staging_path(&self, filename: &str) -> PathBuf {
        self.filter
            .classifier
            .local_path(&self.config.staging_root, filename)
    }

    pub fn remote_key(&self, filename: &str) -> String {
        self.layout.key_for(&self.filter.classifier, filename)
    }
}

type Scanner = fn(&Path, &ScanFilter) -> Result<Vec<String>, ReconcileError>;

async fn scan_blocking(
    root: PathBuf,
    filter: ScanFilter,
    scan: Scanner,
) -> Result<Vec<String>, ReconcileError> {
    let path = root.clone();
    tokio::task::spawn_blocking(move || scan(&root, &filter))
        .await
        .map_err(|e| ReconcileError::io(path, std::io::Error::other(e)))?
}
