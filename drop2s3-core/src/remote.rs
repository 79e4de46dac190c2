//! A bucket emulated as a directory tree: key `a/b/c.jpg` lives at `root/a/b/c.jpg`.
//!
//! Used by the test-suite and by `remote.emulate_root` for dry runs against a local
//! mirror of the bucket.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use walkdir::WalkDir;

use crate::contract::ObjectStore;
use crate::error::TransportError;

#[derive(Debug, Clone)]
pub struct DirectoryObjectStore {
    root: PathBuf,
}

impl DirectoryObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        key.split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.root.clone(), |path, segment| path.join(segment))
    }
}

#[async_trait]
impl ObjectStore for DirectoryObjectStore {
    async fn list_objects(&self, prefix: &str) -> Result<Vec<String>, TransportError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut keys = Vec::new();
        for entry in WalkDir::new(&self.root) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry.path().strip_prefix(&self.root)?;
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if key.starts_with(prefix) {
                keys.push(key);
            }
        }
        keys.sort();
        tracing::debug!(prefix, count = keys.len(), root = %self.root.display(), "Listed emulated bucket");
        Ok(keys)
    }

    async fn upload(&self, local_path: &Path, key: &str) -> Result<(), TransportError> {
        let dest = self.path_for(key);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(local_path, &dest).await?;
        Ok(())
    }

    async fn download(&self, key: &str, local_path: &Path) -> Result<(), TransportError> {
        let src = self.path_for(key);
        if !src.is_file() {
            return Err(format!("no such key: {key}").into());
        }
        tokio::fs::copy(&src, local_path).await?;
        Ok(())
    }
}
