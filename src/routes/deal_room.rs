// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Public deal room routes.

use crate::error::Result;
use crate::extract::JsonBody;
use crate::models::{DealRoomAction, DealRoomActivity, DealRoomDocument};
use crate::time_utils::now_rfc3339;
use crate::AppState;
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

const MAX_USER_AGENT_LEN: usize = 512;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/deal-room/documents", get(list_documents))
        .route("/api/deal-room/activity", post(log_activity))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DocumentsResponse {
    pub documents: Vec<DealRoomDocument>,
}

/// List deal room documents in display order. Locked documents are listed
/// without their links.
async fn list_documents(State(state): State<Arc<AppState>>) -> Result<Json<DocumentsResponse>> {
    let documents = state
        .db
        .list_deal_room_documents()
        .await?
        .into_iter()
        .map(DealRoomDocument::for_public_listing)
        .collect();
    Ok(Json(DocumentsResponse { documents }))
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct ActivityRequest {
    #[serde(default)]
    #[validate(email)]
    email: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 200))]
    name: String,
    action: DealRoomAction,
    #[serde(default)]
    #[validate(length(max = 128))]
    document_id: Option<String>,
    #[serde(default)]
    #[validate(length(max = 300))]
    document_name: Option<String>,
}

/// Client address as reported by the reverse proxy.
pub(crate) fn client_ip(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    let real_ip = headers
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    forwarded
        .or(real_ip)
        .unwrap_or("unknown")
        .to_string()
}

/// Append a view/download/share event to the audit log.
async fn log_activity(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    JsonBody(body): JsonBody<ActivityRequest>,
) -> Result<StatusCode> {
    body.validate()?;

    let user_agent: String = headers
        .get(header::USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("unknown")
        .chars()
        .take(MAX_USER_AGENT_LEN)
        .collect();

    let event = DealRoomActivity {
        id: uuid::Uuid::new_v4().to_string(),
        email: body.email.trim().to_lowercase(),
        name: body.name.trim().to_string(),
        action: body.action,
        document_id: body.document_id,
        document_name: body.document_name,
        timestamp: now_rfc3339(),
        ip_address: client_ip(&headers),
        user_agent,
    };

    state.db.append_deal_room_activity(&event).await?;

    tracing::info!(
        action = ?event.action,
        document_id = ?event.document_id,
        "Deal room activity logged"
    );

    Ok(StatusCode::CREATED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_client_ip_prefers_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.1"));
        assert_eq!(client_ip(&headers), "203.0.113.7");
    }

    #[test]
    fn test_client_ip_fallbacks() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers), "unknown");

        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        assert_eq!(client_ip(&headers), "198.51.100.2");
    }
}
