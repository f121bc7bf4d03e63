// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Visitor tracking routes.
//!
//! Both endpoints are upserts keyed by `userId`. Progress can only be
//! recorded for a visitor the activity endpoint has already seen.

use crate::error::{AppError, Result};
use crate::extract::JsonBody;
use crate::models::FunnelProgress;
use crate::AppState;
use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const MAX_USER_ID_LEN: usize = 128;
const MAX_PAGE_LEN: usize = 512;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/track/activity", post(track_activity))
        .route("/api/track/progress", post(track_progress))
}

fn validate_user_id(user_id: &str) -> Result<()> {
    if user_id.trim().is_empty() {
        return Err(AppError::BadRequest("'userId' is required".to_string()));
    }
    if user_id.len() > MAX_USER_ID_LEN || user_id.contains('/') {
        return Err(AppError::BadRequest("Invalid 'userId'".to_string()));
    }
    Ok(())
}

// ─── Activity ────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActivityRequest {
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    page: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TrackResponse {
    pub success: bool,
}

/// Record a page visit, creating the visitor record on first sight.
async fn track_activity(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<ActivityRequest>,
) -> Result<Json<TrackResponse>> {
    validate_user_id(&body.user_id)?;
    if body.page.trim().is_empty() || body.page.len() > MAX_PAGE_LEN {
        return Err(AppError::BadRequest("Invalid 'page'".to_string()));
    }

    let activity = state
        .db
        .record_visit(&body.user_id, &body.email, &body.page)
        .await?;

    tracing::debug!(
        user_id = %activity.user_id,
        page = %body.page,
        visits = activity.visit_history.len(),
        "Activity tracked"
    );

    Ok(Json(TrackResponse { success: true }))
}

// ─── Progress ────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProgressRequest {
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    progress: FunnelProgress,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProgressResponse {
    pub success: bool,
    /// Progress after the merge
    pub progress: FunnelProgress,
}

/// Merge reported milestones into an existing visitor's progress.
async fn track_progress(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<ProgressRequest>,
) -> Result<Json<ProgressResponse>> {
    validate_user_id(&body.user_id)?;

    let progress = state
        .db
        .merge_progress(&body.user_id, &body.progress)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("No activity recorded for user {}", body.user_id))
        })?;

    tracing::debug!(user_id = %body.user_id, "Progress merged");

    Ok(Json(ProgressResponse {
        success: true,
        progress,
    }))
}
