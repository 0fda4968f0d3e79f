// tests/integration/file_store_test.rs

//! Integration tests for the JSON-file identity store

use super::fixtures::{ALICE, BOB};
use super::test_helpers::init_tracing;
use std::sync::Arc;
use tempfile::TempDir;
use userpass::core::UserpassError;
use userpass::core::store::{CasOutcome, FileStore, IdentityStore};
use userpass::userpass::{PolicyUpdater, UpdatePoliciesRequest, UserEntry};

fn store_in(dir: &TempDir) -> FileStore {
    FileStore::new(dir.path().join("data").join("users.json"))
}

#[tokio::test]
async fn test_missing_file_is_an_empty_store() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    assert!(store.get(ALICE).await.unwrap().is_none());
    assert!(!store.path().exists());
}

#[tokio::test]
async fn test_put_creates_file_and_bumps_versions() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    store.put(ALICE, UserEntry::new(ALICE)).await.unwrap();
    assert!(store.path().exists());
    assert_eq!(store.get(ALICE).await.unwrap().unwrap().version, 1);

    store.put(ALICE, UserEntry::new(ALICE)).await.unwrap();
    assert_eq!(store.get(ALICE).await.unwrap().unwrap().version, 2);
    assert!(store.get(BOB).await.unwrap().is_none());
}

#[tokio::test]
async fn test_put_if_version_detects_stale_writes() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    store.put(ALICE, UserEntry::new(ALICE)).await.unwrap();

    let mut entry = UserEntry::new(ALICE);
    entry.policies = "admin".parse().unwrap();

    assert_eq!(
        store.put_if_version(ALICE, entry.clone(), 7).await.unwrap(),
        CasOutcome::Conflict
    );
    assert_eq!(
        store.put_if_version(BOB, entry.clone(), 1).await.unwrap(),
        CasOutcome::Conflict
    );
    assert_eq!(
        store.put_if_version(ALICE, entry.clone(), 1).await.unwrap(),
        CasOutcome::Applied
    );

    let stored = store.get(ALICE).await.unwrap().unwrap();
    assert_eq!(stored.version, 2);
    assert_eq!(stored.value, entry);
    assert!(store.get(BOB).await.unwrap().is_none());
}

#[tokio::test]
async fn test_update_persists_across_store_instances() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let mut seeded = UserEntry::new(ALICE);
    seeded.password_hash = "hash".to_string();
    seeded.legacy_policies = "default".parse().unwrap();
    store_in(&dir).put(ALICE, seeded).await.unwrap();

    let updater = PolicyUpdater::new(Arc::new(store_in(&dir)));
    let response = updater
        .update_policies(
            &UpdatePoliciesRequest::new(ALICE)
                .with_token_policies("admin, ops")
                .with_legacy_policies("ignored"),
        )
        .await
        .unwrap();
    assert!(response.warning.is_some());

    let reopened = store_in(&dir);
    let stored = reopened.get(ALICE).await.unwrap().unwrap().value;
    assert_eq!(stored.policies.names(), vec!["admin", "ops"]);
    assert!(stored.legacy_policies.is_empty());
    assert_eq!(stored.password_hash, "hash");
}

#[tokio::test]
async fn test_users_file_layout() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let mut entry = UserEntry::new(ALICE);
    entry.policies = "admin,ops".parse().unwrap();
    store.put(ALICE, entry).await.unwrap();

    let contents = std::fs::read_to_string(store.path()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&contents).unwrap();
    let alice = &json["users"][ALICE];
    assert_eq!(alice["version"], 1);
    assert_eq!(alice["username"], ALICE);
    assert_eq!(alice["policies"], serde_json::json!(["admin", "ops"]));
    assert_eq!(alice["legacy_policies"], serde_json::json!([]));
}

#[tokio::test]
async fn test_corrupt_file_is_a_storage_error() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
    std::fs::write(store.path(), "{ not json").unwrap();

    let err = store.get(ALICE).await.unwrap_err();
    assert!(matches!(err, UserpassError::Serialization(_)));
    assert!(err.is_storage());

    let updater = PolicyUpdater::new(Arc::new(store));
    let err = updater
        .update_policies(&UpdatePoliciesRequest::new(ALICE).with_token_policies("admin"))
        .await
        .unwrap_err();
    assert!(matches!(err, UserpassError::Serialization(_)));
}

#[tokio::test]
async fn test_stored_policies_are_normalized_on_load() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
    std::fs::write(
        store.path(),
        r#"{"users":{"alice":{"version":4,"username":"alice","legacy_policies":[" Dev ","dev",""]}}}"#,
    )
    .unwrap();

    let stored = store.get(ALICE).await.unwrap().unwrap();
    assert_eq!(stored.version, 4);
    assert_eq!(stored.value.legacy_policies.names(), vec!["dev"]);
    assert!(stored.value.policies.is_empty());
    assert_eq!(stored.value.password_hash, "");
}

#[tokio::test]
async fn test_unreadable_users_file_is_an_io_error() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let store = FileStore::new(dir.path());

    let err = store.get(ALICE).await.unwrap_err();
    assert!(matches!(err, UserpassError::Io(_)));
    assert!(err.is_storage());

    let err = store.put(ALICE, UserEntry::new(ALICE)).await.unwrap_err();
    assert!(matches!(err, UserpassError::Io(_)));
}

#[tokio::test]
async fn test_unwritable_directory_is_an_io_error() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("data");
    std::fs::write(&blocker, "not a directory").unwrap();
    let store = store_in(&dir);

    let err = store.put(ALICE, UserEntry::new(ALICE)).await.unwrap_err();
    assert!(matches!(err, UserpassError::Io(_)));
    assert_eq!(std::fs::read_to_string(&blocker).unwrap(), "not a directory");
}
