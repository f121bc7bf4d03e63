// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin session and back-office routes.

use crate::error::{AppError, Result};
use crate::extract::JsonBody;
use crate::middleware::auth::{create_jwt, credentials_match, AdminUser, ADMIN_COOKIE};
use crate::models::{
    DealRoomActivity, DealRoomDocument, DocumentCategory, IconType, NewsletterSubscriber,
};
use crate::time_utils::now_rfc3339;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

const DEFAULT_ACTIVITY_LIMIT: u32 = 100;
const MAX_ACTIVITY_LIMIT: u32 = 1000;

/// Login/logout routes (public).
pub fn session_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/admin/login", post(login))
        .route("/api/admin/logout", post(logout))
}

/// Back-office routes. The admin middleware is applied in routes/mod.rs.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/admin/deal-room/documents/{id}", put(upsert_document))
        .route("/api/admin/deal-room/activity", get(list_activity))
        .route("/api/admin/newsletter", get(list_subscribers))
        .route("/api/admin/convert", post(convert_url))
}

// ─── Session ─────────────────────────────────────────────────

#[derive(Deserialize)]
struct LoginRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: u64,
}

fn is_local(frontend_url: &str) -> bool {
    frontend_url.starts_with("http://localhost") || frontend_url.starts_with("http://127.0.0.1")
}

fn session_cookie(value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((ADMIN_COOKIE, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .build()
}

/// Check the admin credential server-side and start a session.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    JsonBody(body): JsonBody<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    if !credentials_match(
        &body.username,
        &body.password,
        &state.config.admin_username,
        &state.config.admin_password,
    ) {
        tracing::warn!("Rejected admin login attempt");
        return Err(AppError::Unauthorized);
    }

    let token = create_jwt(&state.config.admin_username, &state.config.jwt_signing_key)?;
    let secure = !is_local(&state.config.frontend_url);

    tracing::info!("Admin session started");

    Ok((
        jar.add(session_cookie(token.clone(), secure)),
        Json(LoginResponse {
            token,
            expires_in: crate::middleware::auth::SESSION_TTL_SECS as u64,
        }),
    ))
}

/// End the admin session.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, StatusCode) {
    let secure = !is_local(&state.config.frontend_url);
    (
        jar.remove(session_cookie(String::new(), secure)),
        StatusCode::NO_CONTENT,
    )
}

// ─── Deal Room ───────────────────────────────────────────────

/// Same field names as the stored [`DealRoomDocument`].
#[derive(Deserialize, Validate)]
struct DocumentRequest {
    #[validate(length(min = 1, max = 300))]
    title: String,
    category: DocumentCategory,
    icon_type: IconType,
    #[serde(default)]
    #[validate(url)]
    file_url: Option<String>,
    #[serde(default)]
    #[validate(url)]
    external_url: Option<String>,
    #[serde(default)]
    #[validate(url)]
    pdf_url: Option<String>,
    #[serde(default)]
    is_locked: bool,
    #[serde(default)]
    sort_order: i32,
}

/// Create or replace a deal room document.
async fn upsert_document(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminUser>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<DocumentRequest>,
) -> Result<Json<DealRoomDocument>> {
    body.validate()?;
    if id.is_empty() || id.len() > 128 || id.contains('/') {
        return Err(AppError::BadRequest("Invalid document id".to_string()));
    }

    let now = now_rfc3339();
    let created_at = state
        .db
        .get_deal_room_document(&id)
        .await?
        .map(|existing| existing.created_at)
        .unwrap_or_else(|| now.clone());

    let document = DealRoomDocument {
        id,
        title: body.title,
        category: body.category,
        icon_type: body.icon_type,
        file_url: body.file_url,
        external_url: body.external_url,
        pdf_url: body.pdf_url,
        is_locked: body.is_locked,
        sort_order: body.sort_order,
        created_at,
        updated_at: now,
    };

    state.db.upsert_deal_room_document(&document).await?;

    tracing::info!(
        admin = %admin.username,
        document_id = %document.id,
        "Deal room document saved"
    );

    Ok(Json(document))
}

#[derive(Deserialize)]
struct ActivityQuery {
    limit: Option<u32>,
}

#[derive(Serialize)]
struct ActivityListResponse {
    activity: Vec<DealRoomActivity>,
}

/// Most recent deal room activity, newest first.
async fn list_activity(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ActivityQuery>,
) -> Result<Json<ActivityListResponse>> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_ACTIVITY_LIMIT)
        .clamp(1, MAX_ACTIVITY_LIMIT);
    let activity = state.db.list_deal_room_activity(limit).await?;
    Ok(Json(ActivityListResponse { activity }))
}

// ─── Newsletter ──────────────────────────────────────────────

#[derive(Serialize)]
struct SubscribersResponse {
    count: usize,
    subscribers: Vec<NewsletterSubscriber>,
}

async fn list_subscribers(State(state): State<Arc<AppState>>) -> Result<Json<SubscribersResponse>> {
    let subscribers = state.db.list_subscribers().await?;
    Ok(Json(SubscribersResponse {
        count: subscribers.len(),
        subscribers,
    }))
}

// ─── Conversion ──────────────────────────────────────────────

#[derive(Deserialize, Validate)]
struct ConvertRequest {
    #[validate(url)]
    url: String,
}

#[derive(Serialize)]
struct ConvertResponse {
    path: String,
}

/// Fetch an office document and convert it to PDF in the output directory.
async fn convert_url(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<ConvertRequest>,
) -> Result<Json<ConvertResponse>> {
    body.validate()?;

    let path = state
        .converter
        .convert_url_document_to_pdf(&body.url, &state.config.conversion_output_dir)
        .await?;

    Ok(Json(ConvertResponse {
        path: path.display().to_string(),
    }))
}
