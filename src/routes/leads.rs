// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Lead capture routes (call scheduling, webinar registration, newsletter).

use crate::error::{AppError, Result};
use crate::extract::JsonBody;
use crate::models::newsletter::normalize_email;
use crate::models::{NewsletterSubscriber, ScheduleCallRequest, WebinarRegistration};
use crate::time_utils::now_rfc3339;
use crate::AppState;
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/schedule-call", post(schedule_call))
        .route("/api/register-webinar", post(register_webinar))
        // Older front-end builds post here directly.
        .route("/register-webinar", post(register_webinar))
        .route("/api/newsletter/subscribe", post(subscribe))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LeadResponse {
    pub success: bool,
    pub message: String,
}

/// Validate a call request, then send the notification and confirmation.
async fn schedule_call(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<ScheduleCallRequest>,
) -> Result<Json<LeadResponse>> {
    body.validate()?;

    tracing::info!(email = %body.email, "Call scheduling request received");

    state.leads.schedule_call(&body).await?;

    Ok(Json(LeadResponse {
        success: true,
        message: "Call request received".to_string(),
    }))
}

/// Validate a webinar registration, then send the notification and confirmation.
async fn register_webinar(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<WebinarRegistration>,
) -> Result<Json<LeadResponse>> {
    body.validate()?;

    tracing::info!(
        email = %body.email,
        event = %body.event_details.title,
        "Webinar registration received"
    );

    state.leads.register_webinar(&body).await?;

    Ok(Json(LeadResponse {
        success: true,
        message: "Registration confirmed".to_string(),
    }))
}

// ─── Newsletter ──────────────────────────────────────────────

#[derive(Deserialize, Validate)]
struct SubscribeRequest {
    #[serde(default)]
    #[validate(email)]
    email: String,
}

/// Subscribe an email to the newsletter. Each email can subscribe once.
async fn subscribe(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<SubscribeRequest>,
) -> Result<(StatusCode, Json<LeadResponse>)> {
    let body = SubscribeRequest {
        email: normalize_email(&body.email),
    };
    body.validate()?;

    let subscriber = NewsletterSubscriber {
        email: body.email,
        subscribed_at: now_rfc3339(),
    };

    if !state.db.insert_subscriber(&subscriber).await? {
        return Err(AppError::Conflict("Email is already subscribed".to_string()));
    }

    tracing::info!(email = %subscriber.email, "Newsletter subscription created");

    Ok((
        StatusCode::CREATED,
        Json(LeadResponse {
            success: true,
            message: "Subscribed".to_string(),
        }),
    ))
}
