// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use futures_util::future::BoxFuture;
use investor_site::config::Config;
use investor_site::db::FirestoreDb;
use investor_site::routes::create_router;
use investor_site::services::{
    ConversionEngine, ConversionError, DocumentConverter, EmailError, LeadService, MailTransport,
    Mailer, OutboundEmail,
};
use investor_site::AppState;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Mail transport that records every attempted send.
///
/// With `fail_on = Some(n)`, the n-th attempt (0-based) fails.
#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingTransport {
    pub attempts: Mutex<Vec<OutboundEmail>>,
    pub fail_on: Option<usize>,
}

#[allow(dead_code)]
impl RecordingTransport {
    pub fn failing_on(attempt: usize) -> Self {
        Self {
            attempts: Mutex::new(Vec::new()),
            fail_on: Some(attempt),
        }
    }

    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.attempts.lock().unwrap().clone()
    }
}

impl MailTransport for RecordingTransport {
    fn send<'a>(&'a self, email: &'a OutboundEmail) -> BoxFuture<'a, Result<(), EmailError>> {
        Box::pin(async move {
            let mut attempts = self.attempts.lock().unwrap();
            let index = attempts.len();
            attempts.push(email.clone());
            if self.fail_on == Some(index) {
                return Err(EmailError::Rejected("mailbox unavailable".to_string()));
            }
            Ok(())
        })
    }
}

/// Conversion engine that returns a fixed PDF, or fails.
#[allow(dead_code)]
pub struct FakeEngine {
    pub fail: bool,
}

#[allow(dead_code)]
pub const FAKE_PDF: &[u8] = b"%PDF-1.7\n% fake\n";

impl ConversionEngine for FakeEngine {
    fn convert<'a>(
        &'a self,
        _source: &'a [u8],
        _extension: &'a str,
    ) -> BoxFuture<'a, Result<Vec<u8>, ConversionError>> {
        Box::pin(async move {
            if self.fail {
                return Err(ConversionError::Engine {
                    exit_code: Some(1),
                    stderr: "source file could not be loaded".to_string(),
                });
            }
            Ok(FAKE_PDF.to_vec())
        })
    }
}

#[allow(dead_code)]
pub fn test_converter(fail: bool) -> DocumentConverter {
    DocumentConverter::new(Arc::new(FakeEngine { fail }), Duration::from_secs(5))
}

/// Test app over the in-memory store.
#[allow(dead_code)]
pub fn create_test_app() -> (Router, Arc<AppState>, Arc<RecordingTransport>) {
    create_test_app_with_transport(RecordingTransport::default())
}

#[allow(dead_code)]
pub fn create_test_app_with_transport(
    transport: RecordingTransport,
) -> (Router, Arc<AppState>, Arc<RecordingTransport>) {
    build_test_app(FirestoreDb::new_in_memory(), transport)
}

/// Test app whose store is disconnected, so every database call fails.
#[allow(dead_code)]
pub fn create_offline_test_app() -> (Router, Arc<AppState>, Arc<RecordingTransport>) {
    build_test_app(FirestoreDb::new_mock(), RecordingTransport::default())
}

fn build_test_app(
    db: FirestoreDb,
    transport: RecordingTransport,
) -> (Router, Arc<AppState>, Arc<RecordingTransport>) {
    let config = Config::test_default();
    let transport = Arc::new(transport);
    let mailer = Mailer::new(transport.clone(), config.outbound_timeout);
    let leads = LeadService::new(mailer, config.notification_email.clone());

    let state = Arc::new(AppState {
        config,
        db,
        leads,
        converter: test_converter(false),
    });

    (create_router(state.clone()), state, transport)
}

/// Send a JSON request and return the status and parsed body (Null if empty).
#[allow(dead_code)]
pub async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    body: serde_json::Value,
    bearer: Option<&str>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let response = app
        .clone()
        .oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };

    (status, json)
}

#[allow(dead_code)]
pub async fn post_json(
    app: &Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send_json(app, "POST", uri, body, None).await
}
