//! Location scanners: which in-scope filenames exist in a directory tree or a bucket.

use std::collections::BTreeSet;
use std::path::Path;

use walkdir::WalkDir;

use crate::contract::ObjectStore;
use crate::error::ReconcileError;
use crate::extension::ExtensionClassifier;
use crate::partition::FilenameMatcher;

/// The two filters every scan applies.
#[derive(Debug, Clone)]
pub struct ScanFilter {
    pub classifier: ExtensionClassifier,
    pub matcher: FilenameMatcher,
}

impl ScanFilter {
    pub fn accepts(&self, filename: &str) -> bool {
        self.classifier.is_supported(filename) && self.matcher.matches(filename)
    }
}

/// Sorted, de-duplicated names of in-scope files anywhere below `root`.
/// A root that does not exist (e.g. a staging dir not created yet) yields nothing.
pub fn scan_directory(root: &Path, filter: &ScanFilter) -> Result<Vec<String>, ReconcileError> {
    scan_walk(root, filter, WalkDir::new(root))
}

/// Like [`scan_directory`], but only files directly in `root`. The inbox is flat, and a
/// file in a subfolder could not be found again by name.
pub fn scan_top_level(root: &Path, filter: &ScanFilter) -> Result<Vec<String>, ReconcileError> {
    scan_walk(root, filter, WalkDir::new(root).max_depth(1))
}

fn scan_walk(root: &Path, filter: &ScanFilter, walk: WalkDir) -> Result<Vec<String>, ReconcileError> {
    if !root.exists() {
        tracing::debug!(root = %root.display(), "[SCAN] Root does not exist, treating as empty");
        return Ok(Vec::new());
    }

    let mut names = BTreeSet::new();
    for entry in walk {
        let entry = entry.map_err(|source| ReconcileError::Scan {
            root: root.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            tracing::warn!(path = %entry.path().display(), "[SCAN] Skipping non UTF-8 filename");
            continue;
        };
        if filter.accepts(name) {
            tracing::debug!(file = name, root = %root.display(), "[SCAN] Found file");
            names.insert(name.to_string());
        }
    }

    tracing::info!(root = %root.display(), count = names.len(), "[SCAN] Directory scanned");
    Ok(names.into_iter().collect())
}

/// Same as [`scan_directory`] but sourced from the keys under `prefix`.
/// Directory placeholder keys (ending in `/`) are ignored.
pub async fn scan_remote<S>(
    remote: &S,
    prefix: &str,
    filter: &ScanFilter,
) -> Result<Vec<String>, ReconcileError>
where
    S: ObjectStore + ?Sized,
{
    let keys = remote
        .list_objects(prefix)
        .await
        .map_err(|source| ReconcileError::RemoteListing {
            prefix: prefix.to_string(),
            source,
        })?;

    let names: BTreeSet<String> = keys
        .iter()
        .filter(|key| key.starts_with(prefix))
        .filter_map(|key| key.rsplit('/').next())
        .filter(|name| !name.is_empty() && filter.accepts(name))
        .map(str::to_string)
        .collect();

    tracing::info!(prefix, keys = keys.len(), count = names.len(), "[SCAN] Remote listing scanned");
    Ok(names.into_iter().collect())
}
