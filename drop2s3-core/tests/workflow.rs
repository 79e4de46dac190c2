use std::fs;
use std::path::Path;

use drop2s3_core::config::SessionConfig;
use drop2s3_core::contract::{AutoConfirm, MockConfirm, MockObjectStore};
use drop2s3_core::partition::PartitionKey;
use drop2s3_core::remote::DirectoryObjectStore;
use drop2s3_core::report::Outcome;
use drop2s3_core::session::ReconcileSession;
use drop2s3_core::workflow::{run_workflow, WorkflowStop, COPY_PROMPT, UPLOAD_PROMPT};
use tempfile::tempdir;

const PREFIX: &str = "photos/2024/01/default/";

fn write(path: &Path, bytes: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, bytes).unwrap();
}

fn config(root: &Path) -> SessionConfig {
    let partition = PartitionKey::new("2024", "01", "default").unwrap();
    SessionConfig::new(partition, root.join("inbox"), root.join("staging").join(PREFIX))
}

#[tokio::test]
async fn test_workflow_stops_when_copy_declined() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("inbox/2024-01-15-IMG1.jpg"), b"x");

    let mut remote = MockObjectStore::new();
    remote.expect_list_objects().returning(|_| Ok(vec![]));
    remote.expect_upload().times(0);

    let mut confirm = MockConfirm::new();
    confirm
        .expect_confirm()
        .withf(|prompt: &str| prompt == COPY_PROMPT)
        .times(1)
        .return_const(false);

    let session = ReconcileSession::build(config(dir.path()), &remote).await.unwrap();
    let report = run_workflow(&session, &remote, &confirm, false).await.unwrap();

    assert_eq!(report.stopped, Some(WorkflowStop::CopyDeclined));
    assert!(report.copy.is_none());
    assert_eq!(report.diff_local.flagged().len(), 1, "inbox-only file is reported");
    assert!(!dir
        .path()
        .join("staging")
        .join(PREFIX)
        .join("2024-01-15-IMG1.jpg")
        .exists());
}

#[tokio::test]
async fn test_workflow_dry_run_stops_after_copy_preview() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("inbox/2024-01-15-IMG1.jpg"), b"x");

    let mut remote = MockObjectStore::new();
    remote.expect_list_objects().returning(|_| Ok(vec![]));
    remote.expect_upload().times(0);

    let mut confirm = MockConfirm::new();
    confirm.expect_confirm().times(1).return_const(true);

    let session = ReconcileSession::build(config(dir.path()), &remote).await.unwrap();
    let report = run_workflow(&session, &remote, &confirm, true).await.unwrap();

    assert_eq!(report.stopped, Some(WorkflowStop::DryRun));
    let copy = report.copy.expect("copy preview should be present");
    assert_eq!(copy.decisions[0].outcome, Outcome::DryRun);
    assert!(report.upload.is_none());
    assert!(!dir.path().join("staging").exists(), "dry run creates nothing");
}

#[tokio::test]
async fn test_workflow_upload_declined_after_copy() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("inbox/2024-01-15-IMG1.jpg"), b"x");
    let remote = DirectoryObjectStore::new(dir.path().join("bucket"));

    let mut confirm = MockConfirm::new();
    confirm
        .expect_confirm()
        .withf(|prompt: &str| prompt == COPY_PROMPT)
        .return_const(true);
    confirm
        .expect_confirm()
        .withf(|prompt: &str| prompt == UPLOAD_PROMPT)
        .return_const(false);

    let session = ReconcileSession::build(config(dir.path()), &remote).await.unwrap();
    let report = run_workflow(&session, &remote, &confirm, false).await.unwrap();

    assert_eq!(report.stopped, Some(WorkflowStop::UploadDeclined));
    assert!(dir
        .path()
        .join("staging")
        .join(PREFIX)
        .join("2024-01-15-IMG1.jpg")
        .exists());
    assert!(!remote.path_for(&format!("{PREFIX}2024-01-15-IMG1.jpg")).exists());
}

#[tokio::test]
async fn test_workflow_full_run_uploads_freshly_staged_files() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("inbox/2024-01-15-IMG1.jpg"), b"image");
    write(&dir.path().join("inbox/2024-01-16-clip.mov"), b"video");
    let remote = DirectoryObjectStore::new(dir.path().join("bucket"));

    let session = ReconcileSession::build(config(dir.path()), &remote).await.unwrap();
    let report = run_workflow(&session, &remote, &AutoConfirm(true), false)
        .await
        .unwrap();

    assert_eq!(report.stopped, None);
    assert_eq!(report.mkdir.created.len(), 2);
    let upload = report.upload.expect("upload should have run");
    assert_eq!(upload.selected().len(), 2);

    assert_eq!(
        fs::read(remote.path_for(&format!("{PREFIX}2024-01-15-IMG1.jpg"))).unwrap(),
        b"image"
    );
    assert_eq!(
        fs::read(remote.path_for(&format!("{PREFIX}video/2024-01-16-clip.mov"))).unwrap(),
        b"video"
    );
    assert!(
        dir.path().join("inbox/2024-01-15-IMG1.jpg").exists(),
        "workflow never deletes from the inbox"
    );
}
