// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Visitor activity and funnel progress.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Email recorded for visitors who have not identified themselves.
pub const ANONYMOUS_EMAIL: &str = "anonymous";

/// Returns true if `email` is a real, self-identified address.
pub fn is_identified(email: &str) -> bool {
    let email = email.trim();
    !email.is_empty() && email != ANONYMOUS_EMAIL
}

/// Per-visitor activity record stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserActivity {
    /// Stable visitor ID (also used as document ID)
    pub user_id: String,
    /// Last known email, or [`ANONYMOUS_EMAIL`]
    pub email: String,
    /// When the record was first created (RFC 3339)
    pub created_at: String,
    /// Last sync time (RFC 3339)
    pub last_active: String,
    /// Funnel milestones reached so far
    #[serde(default)]
    pub progress: FunnelProgress,
    /// Pages visited, oldest first
    #[serde(default)]
    pub visit_history: Vec<VisitEntry>,
}

impl UserActivity {
    /// New record with default progress and an empty history.
    pub fn new(user_id: &str, email: &str, now: &str) -> Self {
        let email = if is_identified(email) {
            email.trim().to_string()
        } else {
            ANONYMOUS_EMAIL.to_string()
        };

        Self {
            user_id: user_id.to_string(),
            email,
            created_at: now.to_string(),
            last_active: now.to_string(),
            progress: FunnelProgress::default(),
            visit_history: Vec::new(),
        }
    }

    /// Apply one activity sync: refresh identity and liveness, append the visit.
    ///
    /// An anonymous sync never overwrites a previously known email.
    pub fn record_visit(&mut self, email: &str, page: &str, now: &str) {
        if is_identified(email) {
            self.email = email.trim().to_string();
        }
        self.last_active = now.to_string();
        self.visit_history.push(VisitEntry {
            page: page.to_string(),
            timestamp: now.to_string(),
            scheduled_date: None,
        });
    }
}

/// One entry of a visitor's navigation history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct VisitEntry {
    pub page: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<String>,
}

/// Funnel milestones. Each field is set independently; `None` means "not
/// reported yet", which is distinct from an explicit `false`.
///
/// The same shape is used for the stored snapshot and for partial updates:
/// fields absent from an update are left untouched by [`FunnelProgress::merge`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FunnelProgress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewed_materials: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewed_deal_room: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloaded_documents: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_call: Option<bool>,
    /// Date the call was booked for, as entered by the visitor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_scheduled_for: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registered_webinar: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registered_interest: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscribed_newsletter: Option<bool>,
}

impl FunnelProgress {
    /// Overwrite every field present in `update`; keep the rest.
    ///
    /// Last write wins. Nothing stops a milestone from going back to `false`.
    pub fn merge(&mut self, update: &FunnelProgress) {
        fn take<T: Clone>(field: &mut Option<T>, update: &Option<T>) {
            if let Some(value) = update {
                *field = Some(value.clone());
            }
        }

        take(&mut self.viewed_materials, &update.viewed_materials);
        take(&mut self.viewed_deal_room, &update.viewed_deal_room);
        take(&mut self.downloaded_documents, &update.downloaded_documents);
        take(&mut self.scheduled_call, &update.scheduled_call);
        take(&mut self.call_scheduled_for, &update.call_scheduled_for);
        take(&mut self.registered_webinar, &update.registered_webinar);
        take(&mut self.registered_interest, &update.registered_interest);
        take(&mut self.subscribed_newsletter, &update.subscribed_newsletter);
    }

    /// True when no milestone has been reported.
    pub fn is_empty(&self) -> bool {
        *self == FunnelProgress::default()
    }
}
