// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity sync client tests.
//!
//! The tracking API is stood in for by a wiremock server.

use investor_site::client::{
    ActivityTracker, JsonFileStorage, KeyValueStore, MemoryStorage, StorageError, SyncOutcome,
};
use investor_site::config::Config;
use investor_site::models::{FunnelProgress, ANONYMOUS_EMAIL};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn tracker(store: Arc<dyn KeyValueStore>, base: &str) -> ActivityTracker {
    ActivityTracker::new(store, base, Duration::from_secs(2)).unwrap()
}

/// Store whose writes always fail.
struct ReadOnlyStorage;

impl KeyValueStore for ReadOnlyStorage {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Io(std::io::Error::other("quota exceeded")))
    }

    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Ok(())
    }
}

#[test]
fn test_user_id_is_stable_within_storage_scope() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStorage::new());
    let first = tracker(store.clone(), "http://localhost:1");
    let id = first.get_or_create_user_id();

    assert_eq!(first.get_or_create_user_id(), id);
    assert_eq!(first.get_or_create_user_id(), id);

    // A second tracker over the same storage sees the same id
    let second = tracker(store, "http://localhost:1");
    assert_eq!(second.get_or_create_user_id(), id);

    // A different storage scope gets its own id
    let other = tracker(Arc::new(MemoryStorage::new()), "http://localhost:1");
    assert_ne!(other.get_or_create_user_id(), id);
}

#[test]
fn test_user_id_survives_reopen_of_file_storage() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("visitor.json");

    let id = tracker(
        Arc::new(JsonFileStorage::open(&path).unwrap()),
        "http://localhost:1",
    )
    .get_or_create_user_id();

    let reopened = tracker(
        Arc::new(JsonFileStorage::open(&path).unwrap()),
        "http://localhost:1",
    );
    assert_eq!(reopened.get_or_create_user_id(), id);
}

#[test]
fn test_record_page_events_locally() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStorage::new());
    let t = tracker(store.clone(), "http://localhost:1");

    t.record_page_view("home");
    t.identify("a@x.com");
    t.record_page_view("deal-room");
    t.record_page_duration("deal-room", 42.5);

    let state = investor_site::client::LocalState::new(store);
    let views = state.page_views().unwrap();
    assert_eq!(views.len(), 2);
    assert_eq!(views[0].page, "home");
    assert_eq!(views[0].email, ANONYMOUS_EMAIL);
    assert_eq!(views[1].email, "a@x.com");
    assert_eq!(views[0].user_id, views[1].user_id);

    let durations = state.page_durations().unwrap();
    assert_eq!(durations.len(), 1);
    assert_eq!(durations[0].duration_seconds, Some(42.5));
}

#[test]
fn test_recording_never_fails_when_storage_is_broken() {
    let t = tracker(Arc::new(ReadOnlyStorage), "http://localhost:1");

    t.record_page_view("home");
    t.record_page_duration("home", 3.0);
    t.mark_progress(&FunnelProgress {
        viewed_materials: Some(true),
        ..Default::default()
    });

    // Still hands out an id even though it can't be stored
    assert!(!t.get_or_create_user_id().is_empty());
}

#[tokio::test]
async fn test_anonymous_sync_sends_activity_only() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/track/activity"))
        .and(body_partial_json(json!({ "email": "anonymous", "page": "home" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/track/progress"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let t = tracker(Arc::new(MemoryStorage::new()), &server.uri());
    let report = t.sync_progress("home").finished().await.unwrap();

    assert_eq!(report.activity, SyncOutcome::Sent);
    assert_eq!(report.progress, SyncOutcome::Skipped);
}

#[tokio::test]
async fn test_identified_sync_sends_activity_and_progress() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/track/activity"))
        .and(body_partial_json(json!({ "email": "a@x.com", "page": "deal-room" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/track/progress"))
        .and(body_partial_json(json!({ "progress": { "viewedDealRoom": true } })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let t = tracker(Arc::new(MemoryStorage::new()), &format!("{}/", server.uri()));
    t.identify("a@x.com");
    t.mark_progress(&FunnelProgress {
        viewed_deal_room: Some(true),
        ..Default::default()
    });

    let report = t.sync_progress("deal-room").finished().await.unwrap();
    assert_eq!(report.activity, SyncOutcome::Sent);
    assert_eq!(report.progress, SyncOutcome::Sent);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].url.path(), "/api/track/activity");
    assert_eq!(requests[1].url.path(), "/api/track/progress");
}

#[tokio::test]
async fn test_sync_failures_are_reported_not_raised() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let t = tracker(Arc::new(MemoryStorage::new()), &server.uri());
    t.identify("a@x.com");

    let report = t.sync_progress("home").finished().await.unwrap();
    assert_eq!(report.activity, SyncOutcome::Failed);
    // Progress is still attempted, once, and not retried
    assert_eq!(report.progress, SyncOutcome::Failed);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[test]
fn test_sync_without_runtime_reports_failure() {
    let t = tracker(Arc::new(MemoryStorage::new()), "http://localhost:1");
    t.identify("a@x.com");

    // Called from plain synchronous code: must not panic
    let handle = t.sync_progress("home");
    assert!(!handle.is_running());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let report = runtime.block_on(handle.finished()).unwrap();
    assert_eq!(report.activity, SyncOutcome::Failed);
    assert_eq!(report.progress, SyncOutcome::Failed);

    let anonymous = tracker(Arc::new(MemoryStorage::new()), "http://localhost:1");
    let report = runtime
        .block_on(anonymous.sync_progress("home").finished())
        .unwrap();
    assert_eq!(report.activity, SyncOutcome::Failed);
    assert_eq!(report.progress, SyncOutcome::Skipped);
}

#[tokio::test]
async fn test_tracker_from_config_targets_api_base_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/track/activity"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = Config {
        api_base_url: server.uri(),
        ..Config::test_default()
    };
    let t = ActivityTracker::from_config(Arc::new(MemoryStorage::new()), &config).unwrap();

    let handle = t.sync_progress("home");
    assert!(handle.is_running());
    let report = handle.finished().await.unwrap();
    assert_eq!(report.activity, SyncOutcome::Sent);
}
