// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore record store tests. Require FIRESTORE_EMULATOR_HOST.

use device_tracker::db::{paths, FirestoreDb, RecordStore};
use device_tracker::identity::MemoryIdentityStore;
use device_tracker::models::{LocationFix, RemoteRecord};
use device_tracker::services::Uploader;
use std::sync::Arc;

mod common;

async fn test_db(collection: &str) -> FirestoreDb {
    FirestoreDb::new("test-project", collection)
        .await
        .expect("Failed to connect to Firestore emulator")
}

#[tokio::test]
async fn test_record_is_overwritten_in_place() {
    require_emulator!();

    let db = test_db("tracker_overwrite_test").await;
    let first = RemoteRecord {
        name: "Alice".to_string(),
        lat: 10.0,
        lng: 20.0,
    };
    let second = RemoteRecord {
        name: "Alice".to_string(),
        lat: 11.0,
        lng: 21.0,
    };

    db.put(paths::MESSAGE, &first).await.expect("First write failed");
    db.put(paths::MESSAGE, &second).await.expect("Second write failed");

    let stored = db
        .get(paths::MESSAGE)
        .await
        .expect("Read failed")
        .expect("Record missing");
    assert_eq!(stored, second);
}

#[tokio::test]
async fn test_uploader_writes_through_firestore() {
    require_emulator!();

    let db = test_db("tracker_uploader_test").await;
    let uploader = Uploader::new(
        Arc::new(MemoryIdentityStore::with_name("Alice")),
        Arc::new(db.clone()),
    );

    uploader
        .on_fix(&LocationFix::now(10.0, 20.0))
        .await
        .expect("Upload task failed");

    let stored = db.get_record(paths::MESSAGE).await.unwrap().unwrap();
    assert_eq!(stored.name, "Alice");
    assert_eq!((stored.lat, stored.lng), (10.0, 20.0));
}

#[tokio::test]
async fn test_offline_db_rejects_writes() {
    let db = FirestoreDb::new_mock();
    let record = RemoteRecord {
        name: "Bob".to_string(),
        lat: 0.0,
        lng: 0.0,
    };

    let err = db.put(paths::MESSAGE, &record).await.unwrap_err();
    assert!(err.is_database_error());
}
