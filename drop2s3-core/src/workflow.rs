//! The guarded backup pipeline:
//! mkdir → diff-local → confirm → copy → re-scan → confirm → upload.
//!
//! The table is rebuilt between copy and upload so the upload step sees the files that
//! were just staged. Deleting inbox files is not part of the workflow.

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::contract::{Confirm, ObjectStore};
use crate::error::{OperationFailure, ReconcileError};
use crate::report::{MkdirReport, OperationReport};
use crate::session::ReconcileSession;
use crate::transfer::{copy_to_staging, diff_local, mkdir_staging, upload_to_remote};

pub const COPY_PROMPT: &str = "About to copy files to the staging dir - do you want to continue?";
pub const UPLOAD_PROMPT: &str = "About to upload files to the bucket - do you want to continue?";

/// Why the workflow ended before uploading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStop {
    CopyDeclined,
    /// Dry runs stop after the copy preview; nothing was staged, so there is nothing
    /// new to preview for upload.
    DryRun,
    UploadDeclined,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkflowReport {
    pub mkdir: MkdirReport,
    pub diff_local: OperationReport,
    pub copy: Option<OperationReport>,
    pub upload: Option<OperationReport>,
    pub stopped: Option<WorkflowStop>,
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
    #[error(transparent)]
    Operation(#[from] OperationFailure),
}

pub async fn run_workflow<S, C>(
    session: &ReconcileSession,
    remote: &S,
    confirm: &C,
    dry_run: bool,
) -> Result<WorkflowReport, WorkflowError>
where
    S: ObjectStore + ?Sized,
    C: Confirm + ?Sized,
{
    info!(partition = %session.partition(), dry_run, "[WORKFLOW] Starting backup workflow");

    let mkdir = mkdir_staging(session, dry_run)?;
    let diff = diff_local(session)?;
    let mut report = WorkflowReport {
        mkdir,
        diff_local: diff,
        copy: None,
        upload: None,
        stopped: None,
    };

    if !confirm.confirm(COPY_PROMPT) {
        info!("[WORKFLOW] Copy declined; stopping");
        report.stopped = Some(WorkflowStop::CopyDeclined);
        return Ok(report);
    }
    report.copy = Some(copy_to_staging(session, dry_run)?);

    if dry_run {
        info!("[WORKFLOW] Skipping upload step since dry run mode is on");
        report.stopped = Some(WorkflowStop::DryRun);
        return Ok(report);
    }

    let refreshed = session.rescan(remote).await?;

    if !confirm.confirm(UPLOAD_PROMPT) {
        info!("[WORKFLOW] Upload declined; stopping");
        report.stopped = Some(WorkflowStop::UploadDeclined);
        return Ok(report);
    }
    report.upload = Some(upload_to_remote(&refreshed, remote, false).await?);

    info!("[WORKFLOW] All done; run rm-inbox to delete backed-up files from the inbox");
    Ok(report)
}
