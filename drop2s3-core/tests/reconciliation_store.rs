use drop2s3_core::store::{Location, ReconciliationState, ReconciliationStore};

struct TestCase {
    name: &'static str,
    locations: Vec<Location>,
    expected: ReconciliationState,
}

#[test]
fn test_classify_matches_presence_table() {
    use Location::*;
    use ReconciliationState::*;

    let test_cases = vec![
        TestCase {
            name: "inbox only",
            locations: vec![Inbox],
            expected: InboxOnly,
        },
        TestCase {
            name: "staging only",
            locations: vec![Staging],
            expected: StagingOnly,
        },
        TestCase {
            name: "remote only",
            locations: vec![Remote],
            expected: RemoteOnly,
        },
        TestCase {
            name: "inbox and staging",
            locations: vec![Inbox, Staging],
            expected: StagedPendingUpload,
        },
        TestCase {
            name: "everywhere",
            locations: vec![Inbox, Staging, Remote],
            expected: FullySynced,
        },
        TestCase {
            name: "inbox and remote, never staged",
            locations: vec![Inbox, Remote],
            expected: StagingSkipped,
        },
        TestCase {
            name: "staging and remote, source cleared",
            locations: vec![Staging, Remote],
            expected: SyncedSourceCleared,
        },
        TestCase {
            name: "upsert order does not matter",
            locations: vec![Remote, Staging, Inbox],
            expected: FullySynced,
        },
    ];

    for tc in test_cases {
        let mut store = ReconciliationStore::new();
        for loc in &tc.locations {
            store.upsert_presence("2024-01-15-IMG1.jpg", *loc);
        }
        let record = store
            .get("2024-01-15-IMG1.jpg")
            .expect("record should exist after upsert");
        assert_eq!(
            ReconciliationStore::classify(&record),
            tc.expected,
            "{}: unexpected state",
            tc.name
        );
        assert_eq!(store.len(), 1, "{}: exactly one record per filename", tc.name);
    }
}

#[test]
fn test_no_flags_is_unreachable() {
    assert_eq!(
        ReconciliationState::from_flags(false, false, false),
        ReconciliationState::Unreachable
    );
}

#[test]
fn test_upsert_is_idempotent_and_never_downgrades() {
    let mut once = ReconciliationStore::new();
    once.upsert_presence("a.jpg", Location::Staging);

    let mut twice = ReconciliationStore::new();
    twice.upsert_presence("a.jpg", Location::Staging);
    twice.upsert_presence("a.jpg", Location::Staging);

    assert_eq!(once.get("a.jpg"), twice.get("a.jpg"));
    assert_eq!(twice.len(), 1);

    twice.upsert_presence("a.jpg", Location::Inbox);
    let record = twice.get("a.jpg").unwrap();
    assert!(record.in_inbox);
    assert!(record.in_staging, "earlier flag must stay set");
    assert!(!record.in_remote);
}

#[test]
fn test_iteration_is_sorted_and_restartable() {
    let mut store = ReconciliationStore::new();
    for name in ["c.jpg", "a.mov", "b.png"] {
        store.upsert_presence(name, Location::Inbox);
    }
    store.upsert_presence("a.mov", Location::Remote);

    let first: Vec<String> = store.iter().map(|r| r.filename).collect();
    let second: Vec<String> = store.iter().map(|r| r.filename).collect();
    assert_eq!(first, vec!["a.mov", "b.png", "c.jpg"]);
    assert_eq!(first, second);

    assert_eq!(store.filenames_at(Location::Remote), vec!["a.mov"]);
    assert_eq!(store.filenames_at(Location::Inbox).len(), 3);
    assert!(store.filenames_at(Location::Staging).is_empty());
}
