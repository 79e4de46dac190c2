//! In-memory reconciliation table: filename -> where the file was seen.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    Inbox,
    Staging,
    Remote,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Location::Inbox => "inbox",
            Location::Staging => "staging",
            Location::Remote => "remote",
        })
    }
}

/// Reconciliation state derived from the three presence flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationState {
    /// Not yet staged.
    InboxOnly,
    /// Staged, not yet uploaded; the inbox copy is already gone.
    StagingOnly,
    /// Only in the bucket; candidate for download.
    RemoteOnly,
    /// In inbox and staging; safe to upload.
    StagedPendingUpload,
    /// Everywhere; inbox copy may be deleted once its bytes match staging.
    FullySynced,
    /// In inbox and bucket but never staged.
    StagingSkipped,
    /// Staged and uploaded; the source has already been cleared.
    SyncedSourceCleared,
    /// No flag set. Only reachable through a bug in the upsert path.
    Unreachable,
}

impl ReconciliationState {
    pub fn from_flags(in_inbox: bool, in_staging: bool, in_remote: bool) -> Self {
        use ReconciliationState::*;
        match (in_inbox, in_staging, in_remote) {
            (true, false, false) => InboxOnly,
            (false, true, false) => StagingOnly,
            (false, false, true) => RemoteOnly,
            (true, true, false) => StagedPendingUpload,
            (true, true, true) => FullySynced,
            (true, false, true) => StagingSkipped,
            (false, true, true) => SyncedSourceCleared,
            (false, false, false) => Unreachable,
        }
    }

    pub fn as_str(&self) -> &'static str {
        use ReconciliationState::*;
        match self {
            InboxOnly => "inbox-only",
            StagingOnly => "staging-only",
            RemoteOnly => "remote-only",
            StagedPendingUpload => "staged-pending-upload",
            FullySynced => "fully-synced",
            StagingSkipped => "inconsistent-staging-skipped",
            SyncedSourceCleared => "fully-synced-no-source",
            Unreachable => "unreachable",
        }
    }
}

impl fmt::Display for ReconciliationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Presence {
    inbox: bool,
    staging: bool,
    remote: bool,
}

/// One row of the table. Records only come out of a [`ReconciliationStore`], so at least
/// one flag is always set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    pub filename: String,
    pub in_inbox: bool,
    pub in_staging: bool,
    pub in_remote: bool,
}

impl FileRecord {
    pub fn state(&self) -> ReconciliationState {
        let state = ReconciliationState::from_flags(self.in_inbox, self.in_staging, self.in_remote);
        debug_assert!(
            state != ReconciliationState::Unreachable,
            "record '{}' has no presence flag set",
            self.filename
        );
        state
    }

    pub fn is_in(&self, location: Location) -> bool {
        match location {
            Location::Inbox => self.in_inbox,
            Location::Staging => self.in_staging,
            Location::Remote => self.in_remote,
        }
    }
}

/// Filename-keyed presence table. Flags only ever go from `false` to `true`.
#[derive(Debug, Clone, Default)]
pub struct ReconciliationStore {
    rows: BTreeMap<String, Presence>,
}

impl ReconciliationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `filename` as present at `location`, creating the row if needed.
    pub fn upsert_presence(&mut self, filename: &str, location: Location) {
        let row = self.rows.entry(filename.to_string()).or_default();
        match location {
            Location::Inbox => row.inbox = true,
            Location::Staging => row.staging = true,
            Location::Remote => row.remote = true,
        }
    }

    pub fn get(&self, filename: &str) -> Option<FileRecord> {
        self.rows
            .get_key_value(filename)
            .map(|(name, presence)| to_record(name, presence))
    }

    pub fn classify(record: &FileRecord) -> ReconciliationState {
        record.state()
    }

    /// Records in filename order. Each call starts from the beginning.
    pub fn iter(&self) -> Records<'_> {
        Records {
            inner: self.rows.iter(),
        }
    }

    /// Filenames seen at `location`, in filename order.
    pub fn filenames_at(&self, location: Location) -> Vec<String> {
        self.iter()
            .filter(|r| r.is_in(location))
            .map(|r| r.filename)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub struct Records<'a> {
    inner: btree_map::Iter<'a, String, Presence>,
}

impl Iterator for Records<'_> {
    type Item = FileRecord;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(name, p)| to_record(name, p))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

fn to_record(name: &str, p: &Presence) -> FileRecord {
    FileRecord {
        filename: name.to_string(),
        in_inbox: p.inbox,
        in_staging: p.staging,
        in_remote: p.remote,
    }
}
