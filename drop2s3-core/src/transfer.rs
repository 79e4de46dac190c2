//! State-driven transfer operations and diff reports.
//!
//! Every operation walks the session's table in filename order, decides per file from
//! its [`ReconciliationState`], and records a [`Decision`]. With `dry_run` set the same
//! decisions are made and recorded, but no side effect is performed.
//!
//! Writes only ever land under the staging root; deletes only ever touch the inbox.

use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::Path;

use filetime::FileTime;

use crate::config::IntegrityPolicy;
use crate::contract::ObjectStore;
use crate::error::{OperationFailure, ReconcileError};
use crate::extension::VIDEO_SUBDIR;
use crate::report::{Action, Decision, MkdirReport, Operation, OperationReport, Outcome};
use crate::session::ReconcileSession;
use crate::store::{FileRecord, ReconciliationState};

use ReconciliationState::*;

/// Ensures the staging root and its `video/` child exist.
pub fn mkdir_staging(
    session: &ReconcileSession,
    dry_run: bool,
) -> Result<MkdirReport, ReconcileError> {
    let root = session.staging_root().to_path_buf();
    let mut report = MkdirReport {
        dry_run,
        created: Vec::new(),
        existing: Vec::new(),
    };
    for dir in [root.clone(), root.join(VIDEO_SUBDIR)] {
        if dir.is_dir() {
            tracing::info!(path = %dir.display(), "[MKDIR] Staging dir already exists");
            report.existing.push(dir);
            continue;
        }
        if dry_run {
            tracing::info!(path = %dir.display(), "[MKDIR] Dry run; would create staging dir");
        } else {
            fs::create_dir_all(&dir).map_err(|e| ReconcileError::io(&dir, e))?;
            tracing::info!(path = %dir.display(), "[MKDIR] Created staging dir");
        }
        report.created.push(dir);
    }
    Ok(report)
}

/// Copies `inbox-only` files into staging, preserving permissions and mtime.
pub fn copy_to_staging(
    session: &ReconcileSession,
    dry_run: bool,
) -> Result<OperationReport, OperationFailure> {
    let mut report = OperationReport::new(Operation::CopyToStaging, dry_run);

    for record in session.store().iter().filter(|r| r.in_inbox) {
        let name = record.filename.as_str();
        let state = record.state();
        let decision = match state {
            InboxOnly => {
                let src = session.inbox_path(name);
                let dest = session.staging_path(name);
                let outcome = if dry_run {
                    Outcome::DryRun
                } else {
                    if let Err(e) = copy_preserving(&src, &dest) {
                        return Err(halt(
                            report,
                            &record,
                            Action::Copy,
                            ReconcileError::transport(name, Action::Copy, e),
                        ));
                    }
                    Outcome::Done
                };
                Decision::new(name, Action::Copy, state, outcome)
                    .with_route(src.display(), dest.display())
            }
            StagedPendingUpload | FullySynced => Decision::new(
                name,
                Action::Copy,
                state,
                Outcome::skipped("already exists in staging"),
            ),
            StagingSkipped => Decision::new(
                name,
                Action::Copy,
                state,
                Outcome::flagged("present in inbox and remote but never staged; investigate"),
            ),
            StagingOnly | RemoteOnly | SyncedSourceCleared | Unreachable => {
                return Err(invariant_violation(report, &record, state, Action::Copy));
            }
        };
        report.push(decision);
    }

    Ok(report)
}

/// Uploads staged files that are not in the bucket yet.
pub async fn upload_to_remote<S>(
    session: &ReconcileSession,
    remote: &S,
    dry_run: bool,
) -> Result<OperationReport, OperationFailure>
where
    S: ObjectStore + ?Sized,
{
    let mut report = OperationReport::new(Operation::UploadToRemote, dry_run);

    for record in session.store().iter().filter(|r| r.in_staging) {
        let name = record.filename.as_str();
        let state = record.state();
        let decision = match state {
            StagedPendingUpload | StagingOnly => {
                let src = session.staging_path(name);
                let key = session.remote_key(name);
                let outcome = if dry_run {
                    Outcome::DryRun
                } else {
                    if let Err(e) = remote.upload(&src, &key).await {
                        return Err(halt(
                            report,
                            &record,
                            Action::Upload,
                            ReconcileError::transport(name, Action::Upload, e),
                        ));
                    }
                    Outcome::Done
                };
                Decision::new(name, Action::Upload, state, outcome).with_route(src.display(), key)
            }
            FullySynced | SyncedSourceCleared => Decision::new(
                name,
                Action::Upload,
                state,
                Outcome::skipped("already exists in remote"),
            ),
            InboxOnly | RemoteOnly | StagingSkipped | Unreachable => {
                return Err(invariant_violation(report, &record, state, Action::Upload));
            }
        };
        report.push(decision);
    }

    Ok(report)
}

/// Deletes inbox files that are safely backed up in staging *and* remote.
///
/// The inbox copy is compared byte-for-byte with its staging copy first. On a mismatch
/// the session's [`IntegrityPolicy`] decides: `Abort` stops the pass (files deleted
/// earlier in the pass stay deleted), `Skip` flags the file and carries on.
pub fn delete_from_inbox(
    session: &ReconcileSession,
    dry_run: bool,
) -> Result<OperationReport, OperationFailure> {
    let mut report = OperationReport::new(Operation::DeleteFromInbox, dry_run);
    let policy = session.integrity_policy();

    for record in session.store().iter().filter(|r| r.in_inbox) {
        let name = record.filename.as_str();
        let state = record.state();
        let decision = match state {
            FullySynced => {
                let inbox = session.inbox_path(name);
                let staging = session.staging_path(name);
                match files_identical(&inbox, &staging) {
                    Ok(true) => {
                        let outcome = if dry_run {
                            Outcome::DryRun
                        } else {
                            if let Err(e) = fs::remove_file(&inbox) {
                                return Err(halt(
                                    report,
                                    &record,
                                    Action::Delete,
                                    ReconcileError::transport(name, Action::Delete, e),
                                ));
                            }
                            Outcome::Done
                        };
                        Decision::new(name, Action::Delete, state, outcome)
                            .with_route(inbox.display(), "-")
                    }
                    Ok(false) if policy == IntegrityPolicy::Skip => Decision::new(
                        name,
                        Action::Delete,
                        state,
                        Outcome::flagged(format!(
                            "files differ from staging copy {}; kept",
                            staging.display()
                        )),
                    ),
                    Ok(false) => {
                        tracing::error!(
                            file = name,
                            inbox = %inbox.display(),
                            staging = %staging.display(),
                            "[DELETE] Files differ; aborting delete pass"
                        );
                        let error = ReconcileError::IntegrityMismatch {
                            filename: name.to_string(),
                            inbox,
                            staging,
                        };
                        return Err(halt(report, &record, Action::Compare, error));
                    }
                    Err(e) => {
                        return Err(halt(
                            report,
                            &record,
                            Action::Compare,
                            ReconcileError::io(&staging, e),
                        ));
                    }
                }
            }
            InboxOnly => Decision::new(
                name,
                Action::Delete,
                state,
                Outcome::skipped("not in staging or remote; run cp and upload first"),
            ),
            StagedPendingUpload => Decision::new(
                name,
                Action::Delete,
                state,
                Outcome::skipped("not in remote; run upload first"),
            ),
            StagingSkipped => Decision::new(
                name,
                Action::Delete,
                state,
                Outcome::skipped("not in staging, so it cannot be verified; run cp first"),
            ),
            StagingOnly | RemoteOnly | SyncedSourceCleared | Unreachable => {
                return Err(invariant_violation(report, &record, state, Action::Delete));
            }
        };
        report.push(decision);
    }

    Ok(report)
}

/// Downloads `remote-only` files into their staging location.
pub async fn download_from_remote<S>(
    session: &ReconcileSession,
    remote: &S,
    dry_run: bool,
) -> Result<OperationReport, OperationFailure>
where
    S: ObjectStore + ?Sized,
{
    let mut report = OperationReport::new(Operation::DownloadFromRemote, dry_run);

    for record in session.store().iter().filter(|r| r.in_remote) {
        let name = record.filename.as_str();
        let state = record.state();
        let decision = match state {
            RemoteOnly => {
                let key = session.remote_key(name);
                let dest = session.staging_path(name);
                let outcome = if dry_run {
                    Outcome::DryRun
                } else {
                    if let Some(parent) = dest.parent() {
                        if let Err(e) = fs::create_dir_all(parent) {
                            return Err(halt(
                                report,
                                &record,
                                Action::Download,
                                ReconcileError::io(parent, e),
                            ));
                        }
                    }
                    if let Err(e) = remote.download(&key, &dest).await {
                        return Err(halt(
                            report,
                            &record,
                            Action::Download,
                            ReconcileError::transport(name, Action::Download, e),
                        ));
                    }
                    Outcome::Done
                };
                Decision::new(name, Action::Download, state, outcome)
                    .with_route(&key, dest.display())
            }
            FullySynced | SyncedSourceCleared | StagingSkipped => Decision::new(
                name,
                Action::Download,
                state,
                Outcome::skipped("already present locally"),
            ),
            InboxOnly | StagingOnly | StagedPendingUpload | Unreachable => {
                return Err(invariant_violation(report, &record, state, Action::Download));
            }
        };
        report.push(decision);
    }

    Ok(report)
}

/// Inbox vs. staging. Differing bytes are flagged, never fatal.
pub fn diff_local(session: &ReconcileSession) -> Result<OperationReport, OperationFailure> {
    let mut report = OperationReport::new(Operation::DiffLocal, false);

    for record in session.store().iter() {
        let name = record.filename.as_str();
        let state = record.state();
        if state == Unreachable {
            return Err(invariant_violation(report, &record, state, Action::Compare));
        }
        let decision = match (record.in_inbox, record.in_staging, record.in_remote) {
            (true, true, _) => {
                let inbox = session.inbox_path(name);
                let staging = session.staging_path(name);
                let outcome = match files_identical(&inbox, &staging) {
                    Ok(true) => Outcome::ok("diff OK"),
                    Ok(false) => Outcome::flagged("diff NOT OK - files differ"),
                    Err(e) => Outcome::flagged(format!("could not compare: {e}")),
                };
                Decision::new(name, Action::Compare, state, outcome)
            }
            (true, false, _) => {
                Decision::new(name, Action::Report, state, Outcome::flagged("inbox only"))
            }
            (false, false, true) => {
                Decision::new(name, Action::Report, state, Outcome::flagged("remote only"))
            }
            _ => continue,
        };
        report.push(decision);
    }

    Ok(report)
}

/// Staging vs. remote.
pub fn diff_bucket(session: &ReconcileSession) -> Result<OperationReport, OperationFailure> {
    let mut report = OperationReport::new(Operation::DiffBucket, false);

    for record in session.store().iter() {
        let name = record.filename.as_str();
        let state = record.state();
        let outcome = match (record.in_inbox, record.in_staging, record.in_remote) {
            (_, true, true) => Outcome::ok("found in remote & staging"),
            (_, true, false) => Outcome::flagged("staging only"),
            (_, false, true) => Outcome::flagged("remote only"),
            (true, false, false) => Outcome::flagged("inbox only"),
            (false, false, false) => {
                return Err(invariant_violation(report, &record, state, Action::Report));
            }
        };
        report.push(Decision::new(name, Action::Report, state, outcome));
    }

    Ok(report)
}

/// Records the failing file and wraps the error together with the partial report.
fn halt(
    mut report: OperationReport,
    record: &FileRecord,
    action: Action,
    error: ReconcileError,
) -> OperationFailure {
    tracing::error!(file = %record.filename, error = %error, "[{}] Operation halted", report.operation);
    report.push(Decision::new(
        &record.filename,
        action,
        record.state(),
        Outcome::Failed {
            reason: error.to_string(),
        },
    ));
    OperationFailure { report, error }
}

/// A state the operation's selection can never produce, e.g. a record without flags.
fn invariant_violation(
    report: OperationReport,
    record: &FileRecord,
    state: ReconciliationState,
    action: Action,
) -> OperationFailure {
    tracing::error!(file = %record.filename, %state, %action, "[{}] Impossible record state", report.operation);
    OperationFailure {
        report,
        error: ReconcileError::UnreachableState {
            filename: record.filename.clone(),
            state,
        },
    }
}

/// Copies `src` to `dest`, creating parent dirs, keeping permissions and mtime.
/// The mtime is set by path, so read-only sources (and thus read-only copies) work.
fn copy_preserving(src: &Path, dest: &Path) -> io::Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(src, dest)?;
    let mtime = FileTime::from_last_modification_time(&fs::metadata(src)?);
    filetime::set_file_mtime(dest, mtime)
}

/// Byte-for-byte comparison.
pub fn files_identical(a: &Path, b: &Path) -> io::Result<bool> {
    if fs::metadata(a)?.len() != fs::metadata(b)?.len() {
        return Ok(false);
    }
    let mut ra = BufReader::new(File::open(a)?);
    let mut rb = BufReader::new(File::open(b)?);
    let mut buf_a = [0u8; 8192];
    let mut buf_b = [0u8; 8192];
    loop {
        let n = ra.read(&mut buf_a)?;
        if n == 0 {
            return Ok(true);
        }
        rb.read_exact(&mut buf_b[..n])?;
        if buf_a[..n] != buf_b[..n] {
            return Ok(false);
        }
    }
}
