//! # contract: the seams between the reconciliation core and its collaborators
//!
//! - [`ObjectStore`]: the three object-store primitives the core relies on. The CLI
//!   crate implements it for S3; [`crate::remote::DirectoryObjectStore`] emulates a
//!   bucket on the local filesystem.
//! - [`Confirm`]: the interactive yes/no gate the workflow pauses on.
//!
//! Both traits are annotated for `mockall` so tests can script them.

use std::path::Path;

use async_trait::async_trait;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::error::TransportError;

/// Object-store primitives. Implementations do not retry; failures propagate as-is.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Every key under `prefix`, in lexicographic order.
    async fn list_objects(&self, prefix: &str) -> Result<Vec<String>, TransportError>;

    /// Upload the file at `local_path` to `key`.
    async fn upload(&self, local_path: &Path, key: &str) -> Result<(), TransportError>;

    /// Download `key` to `local_path`. The parent directory already exists.
    async fn download(&self, key: &str, local_path: &Path) -> Result<(), TransportError>;
}

/// Asks the operator before a step with side effects.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait Confirm: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Answers every prompt with the same value. Backs `--yes` in the CLI.
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

impl Confirm for AutoConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        tracing::info!(prompt, answer = self.0, "[CONFIRM] Auto-answered prompt");
        self.0
    }
}
