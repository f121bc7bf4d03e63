// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Lead-capture form submissions.
//!
//! Required fields default to empty strings when missing so that absent and
//! blank values fail the same validation rule (400) instead of a JSON
//! deserialization rejection.

use serde::Deserialize;
use validator::{Validate, ValidationError};

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Call-scheduling form.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleCallRequest {
    #[serde(default)]
    #[validate(custom(function = "not_blank"), length(max = 200))]
    pub name: String,
    #[serde(default)]
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub company: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "not_blank"), length(max = 200))]
    pub time_preference: String,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub message: Option<String>,
}

/// Webinar event the visitor is registering for.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EventDetails {
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub title: String,
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub date: String,
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub start_time: String,
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub end_time: String,
}

/// Webinar registration form.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WebinarRegistration {
    #[serde(default)]
    #[validate(custom(function = "not_blank"), length(max = 200))]
    pub name: String,
    #[serde(default)]
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub company: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub event_details: EventDetails,
}
