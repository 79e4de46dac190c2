//! Structured decision records emitted by every operation.
//!
//! The core never prints. Callers render an [`OperationReport`] however they like
//! (the CLI prints a fixed-width table or JSON).

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::store::ReconciliationState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    CopyToStaging,
    UploadToRemote,
    DeleteFromInbox,
    DownloadFromRemote,
    DiffLocal,
    DiffBucket,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::CopyToStaging => "copy-to-staging",
            Operation::UploadToRemote => "upload-to-remote",
            Operation::DeleteFromInbox => "delete-from-inbox",
            Operation::DownloadFromRemote => "download-from-remote",
            Operation::DiffLocal => "diff-local",
            Operation::DiffBucket => "diff-bucket",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Copy,
    Upload,
    Delete,
    Download,
    Compare,
    Report,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Copy => "copy",
            Action::Upload => "upload",
            Action::Delete => "delete",
            Action::Download => "download",
            Action::Compare => "compare",
            Action::Report => "report",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// The side effect was performed.
    Done,
    /// The side effect would have been performed.
    DryRun,
    /// A prerequisite is missing or the work is already done.
    Skipped { reason: String },
    /// Diff: the file is where it should be.
    Ok { detail: String },
    /// Needs attention, but does not stop the run.
    Flagged { reason: String },
    /// The operation stopped on this file.
    Failed { reason: String },
}

impl Outcome {
    pub fn skipped(reason: impl Into<String>) -> Self {
        Outcome::Skipped {
            reason: reason.into(),
        }
    }

    pub fn flagged(reason: impl Into<String>) -> Self {
        Outcome::Flagged {
            reason: reason.into(),
        }
    }

    pub fn ok(detail: impl Into<String>) -> Self {
        Outcome::Ok {
            detail: detail.into(),
        }
    }

    /// True for `Done` and `DryRun`: the file was selected for the side effect.
    pub fn is_selected(&self) -> bool {
        matches!(self, Outcome::Done | Outcome::DryRun)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Done => f.write_str("done"),
            Outcome::DryRun => f.write_str("dry run"),
            Outcome::Skipped { reason } => write!(f, "skipped: {reason}"),
            Outcome::Ok { detail } => write!(f, "OK: {detail}"),
            Outcome::Flagged { reason } => write!(f, "FLAGGED: {reason}"),
            Outcome::Failed { reason } => write!(f, "FAILED: {reason}"),
        }
    }
}

/// What was decided for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub filename: String,
    pub action: Action,
    pub state: ReconciliationState,
    pub outcome: Outcome,
    /// Source and destination of the side effect, where there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
}

impl Decision {
    pub fn new(filename: &str, action: Action, state: ReconciliationState, outcome: Outcome) -> Self {
        Self {
            filename: filename.to_string(),
            action,
            state,
            outcome,
            from: None,
            to: None,
        }
    }

    pub fn with_route(mut self, from: impl fmt::Display, to: impl fmt::Display) -> Self {
        self.from = Some(from.to_string());
        self.to = Some(to.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationReport {
    pub operation: Operation,
    pub dry_run: bool,
    pub decisions: Vec<Decision>,
}

impl OperationReport {
    pub fn new(operation: Operation, dry_run: bool) -> Self {
        Self {
            operation,
            dry_run,
            decisions: Vec::new(),
        }
    }

    pub fn push(&mut self, decision: Decision) {
        tracing::info!(
            operation = %self.operation,
            file = %decision.filename,
            state = %decision.state,
            action = %decision.action,
            outcome = %decision.outcome,
            dry_run = self.dry_run,
            "[{}] decision",
            self.operation
        );
        self.decisions.push(decision);
    }

    /// Filenames whose decision selected the side effect (performed or dry-run).
    pub fn selected(&self) -> Vec<&str> {
        self.decisions
            .iter()
            .filter(|d| d.outcome.is_selected())
            .map(|d| d.filename.as_str())
            .collect()
    }

    pub fn flagged(&self) -> Vec<&Decision> {
        self.decisions
            .iter()
            .filter(|d| matches!(d.outcome, Outcome::Flagged { .. }))
            .collect()
    }

    pub fn find(&self, filename: &str) -> Option<&Decision> {
        self.decisions.iter().find(|d| d.filename == filename)
    }
}

/// Result of ensuring the staging directories exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MkdirReport {
    pub dry_run: bool,
    pub created: Vec<PathBuf>,
    pub existing: Vec<PathBuf>,
}
