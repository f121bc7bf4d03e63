// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - User activity (page visits and funnel progress)
//! - Newsletter subscribers
//! - Deal room documents and the deal room audit log
//!
//! Visit appends run in a transaction so `visit_history` never loses an
//! entry. Progress merges write only the `progress` field and race
//! last-write-wins with each other.

use crate::db::collections;
use crate::db::MemoryStore;
use crate::error::AppError;
use crate::models::deal_room::sort_for_display;
use crate::models::newsletter::subscriber_doc_id;
use crate::models::{
    DealRoomActivity, DealRoomDocument, FunnelProgress, NewsletterSubscriber, UserActivity,
};
use crate::time_utils::now_rfc3339;
use firestore::errors::{BackoffError, FirestoreError};
use firestore::{paths, FirestoreWritePrecondition};
use std::sync::Arc;

#[derive(Clone)]
enum Backend {
    Firestore(firestore::FirestoreDb),
    Memory(Arc<MemoryStore>),
    Offline,
}

/// Document store client.
#[derive(Clone)]
pub struct FirestoreDb {
    backend: Backend,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            backend: Backend::Firestore(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            backend: Backend::Firestore(client),
        })
    }

    /// Create a store backed by process memory.
    pub fn new_in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(MemoryStore::new())),
        }
    }

    /// Create a mock client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self {
            backend: Backend::Offline,
        }
    }

    fn offline() -> AppError {
        AppError::Database("Database not connected (offline mode)".to_string())
    }

    // ─── User Activity Operations ────────────────────────────────

    /// Get the activity record for a visitor.
    pub async fn get_user_activity(&self, user_id: &str) -> Result<Option<UserActivity>, AppError> {
        match &self.backend {
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .by_id_in(collections::USER_ACTIVITY)
                .obj()
                .one(user_id)
                .await
                .map_err(|e| AppError::Database(e.to_string())),
            Backend::Memory(store) => Ok(store.get_user_activity(user_id)),
            Backend::Offline => Err(Self::offline()),
        }
    }

    /// Upsert a visitor record and append one visit to its history.
    ///
    /// Creates the record with default progress if absent. On Firestore the
    /// read-modify-write runs in a transaction, so concurrent visits from the
    /// same visitor are retried instead of dropping an appended entry.
    pub async fn record_visit(
        &self,
        user_id: &str,
        email: &str,
        page: &str,
    ) -> Result<UserActivity, AppError> {
        let now = now_rfc3339();

        match &self.backend {
            Backend::Firestore(client) => client
                .run_transaction(|db, transaction| {
                    let (user_id, email, page, now) = (
                        user_id.to_string(),
                        email.to_string(),
                        page.to_string(),
                        now.clone(),
                    );

                    Box::pin(async move {
                        // Read through the transaction so a concurrent write forces a retry
                        let existing: Option<UserActivity> = db
                            .fluent()
                            .select()
                            .by_id_in(collections::USER_ACTIVITY)
                            .obj()
                            .one(&user_id)
                            .await?;

                        let mut activity = existing
                            .unwrap_or_else(|| UserActivity::new(&user_id, &email, &now));
                        activity.record_visit(&email, &page, &now);

                        db.fluent()
                            .update()
                            .in_col(collections::USER_ACTIVITY)
                            .document_id(&user_id)
                            .object(&activity)
                            .add_to_transaction(transaction)?;

                        Ok::<_, BackoffError<FirestoreError>>(activity)
                    })
                })
                .await
                .map_err(|e| AppError::Database(format!("Visit transaction failed: {}", e))),
            Backend::Memory(store) => Ok(store.record_visit(user_id, email, page, &now)),
            Backend::Offline => Err(Self::offline()),
        }
    }

    /// Merge progress fields into an existing visitor record.
    ///
    /// Returns `None` without writing anything if the visitor is unknown.
    /// Only the `progress` field is written; `visit_history` and `last_active`
    /// belong to [`FirestoreDb::record_visit`].
    pub async fn merge_progress(
        &self,
        user_id: &str,
        update: &FunnelProgress,
    ) -> Result<Option<FunnelProgress>, AppError> {
        match &self.backend {
            Backend::Firestore(client) => {
                let Some(mut activity) = self.get_user_activity(user_id).await? else {
                    return Ok(None);
                };
                activity.progress.merge(update);

                let _: () = client
                    .fluent()
                    .update()
                    .fields(paths!(UserActivity::{progress}))
                    .in_col(collections::USER_ACTIVITY)
                    .precondition(FirestoreWritePrecondition::Exists(true))
                    .document_id(user_id)
                    .object(&activity)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;

                Ok(Some(activity.progress))
            }
            Backend::Memory(store) => Ok(store.merge_progress(user_id, update)),
            Backend::Offline => Err(Self::offline()),
        }
    }

    // ─── Newsletter Operations ───────────────────────────────────

    /// Insert a subscriber. Returns `false` if the email is already subscribed.
    pub async fn insert_subscriber(&self, subscriber: &NewsletterSubscriber) -> Result<bool, AppError> {
        match &self.backend {
            Backend::Firestore(client) => {
                let result: Result<(), _> = client
                    .fluent()
                    .insert()
                    .into(collections::NEWSLETTER_SUBSCRIBERS)
                    .document_id(subscriber_doc_id(&subscriber.email))
                    .object(subscriber)
                    .execute()
                    .await;

                match result {
                    Ok(()) => Ok(true),
                    Err(FirestoreError::DataConflictError(_)) => Ok(false),
                    Err(e) => Err(AppError::Database(e.to_string())),
                }
            }
            Backend::Memory(store) => Ok(store.insert_subscriber(subscriber)),
            Backend::Offline => Err(Self::offline()),
        }
    }

    /// All subscribers, oldest first.
    pub async fn list_subscribers(&self) -> Result<Vec<NewsletterSubscriber>, AppError> {
        match &self.backend {
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .from(collections::NEWSLETTER_SUBSCRIBERS)
                .order_by([(
                    "subscribed_at",
                    firestore::FirestoreQueryDirection::Ascending,
                )])
                .obj()
                .query()
                .await
                .map_err(|e| AppError::Database(e.to_string())),
            Backend::Memory(store) => Ok(store.list_subscribers()),
            Backend::Offline => Err(Self::offline()),
        }
    }

    // ─── Deal Room Operations ────────────────────────────────────

    /// All deal room documents in display order.
    pub async fn list_deal_room_documents(&self) -> Result<Vec<DealRoomDocument>, AppError> {
        let mut documents: Vec<DealRoomDocument> = match &self.backend {
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .from(collections::DEAL_ROOM_DOCUMENTS)
                .order_by([("sort_order", firestore::FirestoreQueryDirection::Ascending)])
                .obj()
                .query()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?,
            Backend::Memory(store) => store.list_deal_room_documents(),
            Backend::Offline => return Err(Self::offline()),
        };

        // Firestore orders by sort_order only; break ties by title here.
        sort_for_display(&mut documents);
        Ok(documents)
    }

    pub async fn get_deal_room_document(
        &self,
        id: &str,
    ) -> Result<Option<DealRoomDocument>, AppError> {
        match &self.backend {
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .by_id_in(collections::DEAL_ROOM_DOCUMENTS)
                .obj()
                .one(id)
                .await
                .map_err(|e| AppError::Database(e.to_string())),
            Backend::Memory(store) => Ok(store.get_deal_room_document(id)),
            Backend::Offline => Err(Self::offline()),
        }
    }

    /// Create or replace a deal room document.
    pub async fn upsert_deal_room_document(
        &self,
        document: &DealRoomDocument,
    ) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(client) => {
                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collections::DEAL_ROOM_DOCUMENTS)
                    .document_id(&document.id)
                    .object(document)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok(())
            }
            Backend::Memory(store) => {
                store.upsert_deal_room_document(document);
                Ok(())
            }
            Backend::Offline => Err(Self::offline()),
        }
    }

    /// Append an event to the deal room audit log.
    pub async fn append_deal_room_activity(&self, event: &DealRoomActivity) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(client) => {
                let _: () = client
                    .fluent()
                    .insert()
                    .into(collections::DEAL_ROOM_ACTIVITY)
                    .document_id(&event.id)
                    .object(event)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok(())
            }
            Backend::Memory(store) => {
                store.append_deal_room_activity(event);
                Ok(())
            }
            Backend::Offline => Err(Self::offline()),
        }
    }

    /// Most recent audit events, newest first.
    pub async fn list_deal_room_activity(
        &self,
        limit: u32,
    ) -> Result<Vec<DealRoomActivity>, AppError> {
        match &self.backend {
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .from(collections::DEAL_ROOM_ACTIVITY)
                .order_by([("timestamp", firestore::FirestoreQueryDirection::Descending)])
                .limit(limit)
                .obj()
                .query()
                .await
                .map_err(|e| AppError::Database(e.to_string())),
            Backend::Memory(store) => Ok(store.list_deal_room_activity(limit as usize)),
            Backend::Offline => Err(Self::offline()),
        }
    }
}
