//! Error taxonomy for the reconciliation engine.
//!
//! Skips caused by a missing prerequisite (e.g. uploading a file that was never staged)
//! are *not* errors: they show up as [`crate::report::Outcome::Skipped`] decisions.

use std::path::PathBuf;

use thiserror::Error;

use crate::report::{Action, OperationReport};
use crate::store::ReconciliationState;

/// Boxed error returned by transport primitives (object store, local copy/delete).
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("files differ for '{filename}': inbox copy {inbox:?} does not match staging copy {staging:?}")]
    IntegrityMismatch {
        filename: String,
        inbox: PathBuf,
        staging: PathBuf,
    },

    #[error("{action} failed for '{filename}': {source}")]
    Transport {
        filename: String,
        action: Action,
        #[source]
        source: TransportError,
    },

    #[error("listing remote objects under '{prefix}' failed: {source}")]
    RemoteListing {
        prefix: String,
        #[source]
        source: TransportError,
    },

    #[error("record '{filename}' is in impossible state {state}")]
    UnreachableState {
        filename: String,
        state: ReconciliationState,
    },

    #[error("invalid partition: {0}")]
    InvalidPartition(String),

    #[error("scanning {root:?} failed: {source}")]
    Scan {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ReconcileError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ReconcileError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn transport(
        filename: &str,
        action: Action,
        source: impl Into<TransportError>,
    ) -> Self {
        ReconcileError::Transport {
            filename: filename.to_string(),
            action,
            source: source.into(),
        }
    }
}

/// An operation that stopped part-way. Carries the decisions made before the halt so
/// the caller can still render them.
#[derive(Debug, Error)]
#[error("{} halted: {error}", .report.operation)]
pub struct OperationFailure {
    pub report: OperationReport,
    #[source]
    pub error: ReconcileError,
}
