// Store behaviour against a real database file rather than :memory:.

use romodoro::session::SplitStatus;
use romodoro::store::{SessionStore, SqliteStore};

#[test]
fn data_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("sessions.db");

    let session_id = {
        let mut store = SqliteStore::open(&path).unwrap();
        let session = store.create_session("Persisted").unwrap();
        let mut split = store.create_split(session.id, 25, 5).unwrap();
        split.status = SplitStatus::Completed;
        split.end_time = Some(chrono::Utc::now());
        split.actual_focus_seconds = 1500;
        split.actual_rest_seconds = 300;
        store.update_split(&split).unwrap();
        store.update_session_totals(session.id).unwrap();
        session.id
    };

    assert!(path.exists());
    let store = SqliteStore::open(&path).unwrap();
    let session = store.get_last_session().unwrap().unwrap();
    assert_eq!(session.id, session_id);
    assert_eq!(session.name, "Persisted");
    assert_eq!(session.total_focus_seconds, 1500);
    assert_eq!(session.total_rest_seconds, 300);

    let splits = store.get_splits(session_id).unwrap();
    assert_eq!(splits.len(), 1);
    assert_eq!(splits[0].status, SplitStatus::Completed);
}

#[test]
fn crashed_split_is_reconciled_on_next_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sessions.db");

    // a run that dies mid-split leaves the row in progress
    let (session_id, split_id) = {
        let mut store = SqliteStore::open(&path).unwrap();
        let session = store.create_session("Crashed").unwrap();
        let split = store.create_split(session.id, 25, 5).unwrap();
        (session.id, split.id)
    };

    let mut store = SqliteStore::open(&path).unwrap();
    assert_eq!(store.reconcile_orphaned_splits().unwrap(), 1);
    // second pass finds nothing left to repair
    assert_eq!(store.reconcile_orphaned_splits().unwrap(), 0);

    let split = store
        .get_splits(session_id)
        .unwrap()
        .into_iter()
        .find(|s| s.id == split_id)
        .unwrap();
    assert_eq!(split.status, SplitStatus::Cancelled);
    assert_eq!(split.end_time, Some(split.start_time));
    assert_eq!(split.actual_focus_seconds, 0);

    let session = store.get_session(session_id).unwrap().unwrap();
    assert_eq!(session.total_seconds(), 0);
}

#[test]
fn delete_on_disk_leaves_no_orphans() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sessions.db");

    let mut store = SqliteStore::open(&path).unwrap();
    let keep = store.create_session("Keep").unwrap();
    let doomed = store.create_session("Doomed").unwrap();
    store.create_split(keep.id, 10, 2).unwrap();
    store.create_split(doomed.id, 10, 2).unwrap();
    store.create_split(doomed.id, 15, 3).unwrap();

    store.delete_session(doomed.id).unwrap();
    drop(store);

    let store = SqliteStore::open(&path).unwrap();
    let names: Vec<String> = store
        .get_all_sessions()
        .unwrap()
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(names, vec!["Keep".to_string()]);
    assert!(store.get_splits(doomed.id).unwrap().is_empty());
    assert_eq!(store.get_splits(keep.id).unwrap().len(), 1);
}
