use super::intent_store::{FW_SIZE_KEY, FW_VERSION_KEY, UPDATE_FLAG_KEY};
use super::{IntentRecord, IntentStore};
use crate::command::UpdateIntent;
use crate::utils::error::StoreError;
use tempfile::{TempDir, tempdir};

fn create_test_store() -> (IntentStore, sled::Db, TempDir) {
    let dir = tempdir().unwrap();
    let db = sled::open(dir.path()).unwrap();
    let store = IntentStore::from_db(db.clone(), "device").unwrap();
    (store, db, dir)
}

#[test]
fn test_fresh_store_has_nothing_pending() {
    let (store, _db, _dir) = create_test_store();
    assert!(!store.is_pending().unwrap());
    assert!(store.read_and_clear().unwrap().is_none());
}

#[test]
fn test_write_then_read_and_clear() {
    let (store, _db, _dir) = create_test_store();
    store.write_pending("v0.0.2", 1234).unwrap();
    assert!(store.is_pending().unwrap());

    let intent = store.read_and_clear().unwrap();
    assert_eq!(
        intent,
        Some(UpdateIntent {
            candidate_version: "v0.0.2".to_string(),
            expected_size: 1234,
        })
    );
    assert!(!store.is_pending().unwrap());
    assert!(store.read_and_clear().unwrap().is_none());
}

#[test]
fn test_write_pending_is_idempotent() {
    let (store, _db, _dir) = create_test_store();
    store.write_pending("v0.0.2", 1234).unwrap();
    let first = store.snapshot().unwrap();
    store.write_pending("v0.0.2", 1234).unwrap();
    assert_eq!(store.snapshot().unwrap(), first);
}

#[test]
fn test_latest_intent_overwrites_previous() {
    let (store, _db, _dir) = create_test_store();
    store.write_pending("v0.0.10", 999_999).unwrap();
    store.write_pending("v0.0.3", 42).unwrap();
    let intent = store.read_and_clear().unwrap().unwrap();
    assert_eq!(intent.candidate_version, "v0.0.3");
    assert_eq!(intent.expected_size, 42);
}

#[test]
fn test_version_is_stored_zero_padded() {
    let (store, db, _dir) = create_test_store();
    store.write_pending("v1", 7).unwrap();
    let raw = db.open_tree("device").unwrap().get(FW_VERSION_KEY).unwrap().unwrap();
    assert_eq!(&raw[..], b"v1\0\0\0\0\0\0\0\0");
}

#[test]
fn test_overlong_version_is_refused() {
    let (store, _db, _dir) = create_test_store();
    assert!(matches!(
        store.write_pending("v100.200.300", 1),
        Err(StoreError::VersionTooLong { len: 12, max: 10 })
    ));
    assert!(!store.is_pending().unwrap());
}

#[test]
fn test_flag_alone_is_corrupt_and_cleared() {
    let (store, db, _dir) = create_test_store();
    // crash after the flag write, before anything else landed
    db.open_tree("device")
        .unwrap()
        .insert(UPDATE_FLAG_KEY, &[1u8][..])
        .unwrap();

    assert!(matches!(
        store.read_and_clear(),
        Err(StoreError::CorruptIntent(_))
    ));
    assert!(!store.is_pending().unwrap());
    assert!(store.read_and_clear().unwrap().is_none());
}

#[test]
fn test_consumed_intent_leaves_no_size_behind() {
    let (store, _db, _dir) = create_test_store();
    store.write_pending("v0.0.2", 1234).unwrap();
    store.read_and_clear().unwrap().unwrap();
    assert_eq!(
        store.snapshot().unwrap(),
        IntentRecord {
            pending: false,
            candidate_version: Some("v0.0.2".to_string()),
            expected_size: Some(0),
        }
    );
}

#[test]
fn test_flag_without_fresh_size_is_corrupt() {
    let (store, db, _dir) = create_test_store();
    store.write_pending("v0.0.2", 1234).unwrap();
    store.read_and_clear().unwrap().unwrap();

    // a later write that stopped after the version and flag keys
    let tree = db.open_tree("device").unwrap();
    tree.insert(FW_VERSION_KEY, &b"v0.0.3\0\0\0\0"[..]).unwrap();
    tree.insert(UPDATE_FLAG_KEY, &[1u8][..]).unwrap();

    assert!(matches!(
        store.read_and_clear(),
        Err(StoreError::CorruptIntent(_))
    ));
    assert!(!store.is_pending().unwrap());
}

#[test]
fn test_zeroed_size_is_corrupt() {
    let (store, db, _dir) = create_test_store();
    store.write_pending("v0.0.2", 1234).unwrap();
    db.open_tree("device")
        .unwrap()
        .insert(FW_SIZE_KEY, &0u32.to_be_bytes()[..])
        .unwrap();

    assert!(matches!(
        store.read_and_clear(),
        Err(StoreError::CorruptIntent(_))
    ));
    assert!(!store.is_pending().unwrap());
}

#[test]
fn test_empty_version_is_corrupt_and_size_reset() {
    let (store, db, _dir) = create_test_store();
    let tree = db.open_tree("device").unwrap();
    tree.insert(FW_VERSION_KEY, &[0u8; 10][..]).unwrap();
    tree.insert(UPDATE_FLAG_KEY, &[1u8][..]).unwrap();
    tree.insert(FW_SIZE_KEY, &500u32.to_be_bytes()[..]).unwrap();

    assert!(store.read_and_clear().is_err());
    assert_eq!(
        store.snapshot().unwrap(),
        IntentRecord {
            pending: false,
            candidate_version: None,
            expected_size: Some(0),
        }
    );
}

#[test]
fn test_reset_size() {
    let (store, _db, _dir) = create_test_store();
    store.write_pending("v0.0.2", 1234).unwrap();
    store.reset_size().unwrap();
    assert_eq!(store.snapshot().unwrap().expected_size, Some(0));
}
