// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Visitor activity tracking with best-effort server sync.
//!
//! Delivery contract: **best-effort, at-most-once, no retry.** Local
//! recording never fails the caller. [`ActivityTracker::sync_progress`]
//! returns immediately; the network calls run on a background task and
//! their failures are only logged. Nothing orders the syncs of two
//! different page visits relative to each other.

use crate::client::storage::{KeyValueStore, LocalState, PageEvent};
use crate::config::Config;
use crate::models::activity::is_identified;
use crate::models::FunnelProgress;
use crate::time_utils::now_rfc3339;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Result of one leg of a sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Sent,
    /// Not attempted (progress is only sent for identified visitors)
    Skipped,
    Failed,
}

/// What a finished sync did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    pub activity: SyncOutcome,
    pub progress: SyncOutcome,
}

/// Handle to an in-flight sync.
///
/// Dropping it detaches the sync; it still runs to completion. Awaiting
/// [`SyncHandle::finished`] is only useful for diagnostics and tests.
pub struct SyncHandle {
    inner: SyncState,
}

enum SyncState {
    Running(JoinHandle<SyncReport>),
    /// Never started (no runtime to run on)
    NotStarted(SyncReport),
}

impl SyncHandle {
    /// True if the sync is running in the background.
    pub fn is_running(&self) -> bool {
        matches!(self.inner, SyncState::Running(_))
    }

    pub async fn finished(self) -> Option<SyncReport> {
        match self.inner {
            SyncState::Running(task) => task.await.ok(),
            SyncState::NotStarted(report) => Some(report),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ActivityPayload {
    user_id: String,
    email: String,
    page: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProgressPayload {
    user_id: String,
    progress: FunnelProgress,
}

/// Client-side tracker. Cheap to clone.
#[derive(Clone)]
pub struct ActivityTracker {
    state: LocalState,
    http: reqwest::Client,
    api_base_url: String,
}

impl ActivityTracker {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        api_base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            state: LocalState::new(store),
            http,
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Tracker for the API at `API_BASE_URL`, bounded by `OUTBOUND_TIMEOUT_SECS`.
    pub fn from_config(
        store: Arc<dyn KeyValueStore>,
        config: &Config,
    ) -> Result<Self, reqwest::Error> {
        Self::new(store, config.api_base_url.clone(), config.outbound_timeout)
    }

    /// Stable visitor ID for this storage scope, created on first use.
    ///
    /// If the new ID cannot be persisted it is still returned; the next
    /// call will then mint another one.
    pub fn get_or_create_user_id(&self) -> String {
        match self.state.user_id() {
            Ok(Some(id)) => return id,
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Failed to read stored user id"),
        }

        let id = uuid::Uuid::new_v4().to_string();
        if let Err(e) = self.state.set_user_id(&id) {
            tracing::warn!(error = %e, "Failed to persist user id");
        }
        id
    }

    /// Current email, or the anonymous sentinel.
    pub fn email(&self) -> String {
        self.state.email().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to read stored email");
            crate::models::ANONYMOUS_EMAIL.to_string()
        })
    }

    /// Remember the visitor's self-identified email.
    pub fn identify(&self, email: &str) {
        if let Err(e) = self.state.set_email(email) {
            tracing::warn!(error = %e, "Failed to persist email");
        }
    }

    /// Merge milestones into the locally cached progress snapshot.
    pub fn mark_progress(&self, update: &FunnelProgress) {
        let result = self.state.progress().and_then(|mut progress| {
            progress.merge(update);
            self.state.set_progress(&progress)
        });
        if let Err(e) = result {
            tracing::warn!(error = %e, "Failed to update cached progress");
        }
    }

    /// Cached progress snapshot.
    pub fn progress(&self) -> FunnelProgress {
        self.state.progress().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to read cached progress");
            FunnelProgress::default()
        })
    }

    /// Append a page view to local storage. Never fails.
    pub fn record_page_view(&self, page: &str) {
        let event = self.page_event(page, None);
        if let Err(e) = self.state.push_page_view(event) {
            tracing::warn!(page, error = %e, "Failed to record page view");
        }
    }

    /// Append time spent on a page to local storage. Never fails.
    pub fn record_page_duration(&self, page: &str, duration_seconds: f64) {
        let event = self.page_event(page, Some(duration_seconds));
        if let Err(e) = self.state.push_page_duration(event) {
            tracing::warn!(page, error = %e, "Failed to record page duration");
        }
    }

    fn page_event(&self, page: &str, duration_seconds: Option<f64>) -> PageEvent {
        PageEvent {
            user_id: self.get_or_create_user_id(),
            email: self.email(),
            page: page.to_string(),
            timestamp: now_rfc3339(),
            duration_seconds,
        }
    }

    /// Push the current activity and (for identified visitors) progress to
    /// the server in the background.
    ///
    /// Within one sync the activity call goes first, since the server only
    /// accepts progress for visitors it has seen. Outside a Tokio runtime
    /// nothing is sent and the handle reports every attempted leg as failed.
    pub fn sync_progress(&self, page: &str) -> SyncHandle {
        let user_id = self.get_or_create_user_id();
        let email = self.email();
        let progress = self.progress();
        let identified = is_identified(&email);

        let activity = ActivityPayload {
            user_id: user_id.clone(),
            email,
            page: page.to_string(),
        };
        let progress = identified.then(|| ProgressPayload { user_id, progress });

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                tracing::warn!(page, error = %e, "No async runtime, tracking sync dropped");
                return SyncHandle {
                    inner: SyncState::NotStarted(SyncReport {
                        activity: SyncOutcome::Failed,
                        progress: if progress.is_some() {
                            SyncOutcome::Failed
                        } else {
                            SyncOutcome::Skipped
                        },
                    }),
                };
            }
        };

        let http = self.http.clone();
        let base = self.api_base_url.clone();

        let task = runtime.spawn(async move {
            let activity_outcome =
                post_best_effort(&http, &format!("{base}/api/track/activity"), &activity).await;

            let progress_outcome = match &progress {
                Some(payload) => {
                    post_best_effort(&http, &format!("{base}/api/track/progress"), payload).await
                }
                None => SyncOutcome::Skipped,
            };

            SyncReport {
                activity: activity_outcome,
                progress: progress_outcome,
            }
        });

        SyncHandle {
            inner: SyncState::Running(task),
        }
    }
}

async fn post_best_effort<T: Serialize>(http: &reqwest::Client, url: &str, body: &T) -> SyncOutcome {
    let result = http
        .post(url)
        .json(body)
        .send()
        .await
        .and_then(|response| response.error_for_status());

    match result {
        Ok(_) => SyncOutcome::Sent,
        Err(e) => {
            tracing::warn!(url, error = %e, "Tracking sync failed (not retried)");
            SyncOutcome::Failed
        }
    }
}
