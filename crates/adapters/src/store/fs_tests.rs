// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ct_core::SequentialIdGen;
use tempfile::TempDir;

fn key(name: &str) -> ObjectKey {
    ObjectKey::generate(name, &SequentialIdGen::new("obj"))
}

#[tokio::test]
async fn create_writes_content_under_container() {
    let dir = TempDir::new().unwrap();
    let store = FsObjectStore::new(dir.path());
    let key = key("orders");

    let size = store.create("orders", &key, b"{\"a\":1}").await.unwrap();

    assert_eq!(size, 7);
    let written = std::fs::read(dir.path().join("orders").join(key.as_str())).unwrap();
    assert_eq!(written, b"{\"a\":1}");
}

#[tokio::test]
async fn create_refuses_to_overwrite() {
    let dir = TempDir::new().unwrap();
    let store = FsObjectStore::new(dir.path());
    let key = key("orders");

    store.create("orders", &key, b"first").await.unwrap();
    let err = store.create("orders", &key, b"second").await.unwrap_err();

    assert!(matches!(err, StorageError::AlreadyExists(_)), "{:?}", err);
    let kept = std::fs::read(dir.path().join("orders").join(key.as_str())).unwrap();
    assert_eq!(kept, b"first");
}

#[tokio::test]
async fn empty_content_reports_zero_size() {
    let dir = TempDir::new().unwrap();
    let store = FsObjectStore::new(dir.path());

    let size = store.create("orders", &key("orders"), b"").await.unwrap();
    assert_eq!(size, 0);
}

#[tokio::test]
async fn container_must_be_single_segment() {
    let dir = TempDir::new().unwrap();
    let store = FsObjectStore::new(dir.path());

    for container in ["", "..", "a/b", "a\\b"] {
        let err = store
            .create(container, &key("orders"), b"x")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidPath(_)), "{container}: {err:?}");
    }
}

#[cfg(unix)]
#[tokio::test]
async fn set_access_control_applies_mode() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let store = FsObjectStore::new(dir.path());
    let key = key("orders");
    store.create("orders", &key, b"{}").await.unwrap();

    store
        .set_access_control("orders", &key, &AccessControl::archive_default())
        .await
        .unwrap();

    let path = dir.path().join("orders").join(key.as_str());
    let mode = std::fs::metadata(path).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o776);
}

#[tokio::test]
async fn set_access_control_on_missing_object_fails() {
    let dir = TempDir::new().unwrap();
    let store = FsObjectStore::new(dir.path());

    let result = store
        .set_access_control("orders", &key("orders"), &AccessControl::archive_default())
        .await;
    assert!(result.is_err());
}
