// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Lead capture: call scheduling and webinar registration.
//!
//! Each submission produces two emails, sent in order: an internal
//! notification, then a confirmation to the submitter. If the notification
//! fails the confirmation is never attempted, and callers only learn that
//! the submission as a whole failed.

use crate::models::{ScheduleCallRequest, WebinarRegistration};
use crate::services::email::{EmailError, Mailer, OutboundEmail};

#[derive(Clone)]
pub struct LeadService {
    mailer: Mailer,
    notification_email: String,
}

impl LeadService {
    pub fn new(mailer: Mailer, notification_email: impl Into<String>) -> Self {
        Self {
            mailer,
            notification_email: notification_email.into(),
        }
    }

    /// Send the notification and confirmation for a validated call request.
    pub async fn schedule_call(&self, request: &ScheduleCallRequest) -> Result<(), EmailError> {
        let notification = call_notification(&self.notification_email, request);
        let confirmation = call_confirmation(request);
        self.send_pair(&notification, &confirmation).await
    }

    /// Send the notification and confirmation for a validated webinar registration.
    pub async fn register_webinar(&self, registration: &WebinarRegistration) -> Result<(), EmailError> {
        let notification = webinar_notification(&self.notification_email, registration);
        let confirmation = webinar_confirmation(registration);
        self.send_pair(&notification, &confirmation).await
    }

    async fn send_pair(
        &self,
        notification: &OutboundEmail,
        confirmation: &OutboundEmail,
    ) -> Result<(), EmailError> {
        self.mailer.send(notification).await.inspect_err(|e| {
            tracing::error!(error = %e, to = %notification.to, "Lead notification failed");
        })?;

        self.mailer.send(confirmation).await.inspect_err(|e| {
            tracing::error!(error = %e, to = %confirmation.to, "Lead confirmation failed");
        })?;

        Ok(())
    }
}

fn or_dash(value: &Option<String>) -> &str {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => "-",
    }
}

pub fn call_notification(to: &str, request: &ScheduleCallRequest) -> OutboundEmail {
    OutboundEmail {
        to: to.to_string(),
        reply_to: Some(request.email.clone()),
        subject: format!("New call request from {}", request.name),
        body: format!(
            "A visitor asked to schedule a call.\n\n\
             Name: {}\n\
             Email: {}\n\
             Company: {}\n\
             Preferred time: {}\n\
             Message:\n{}\n",
            request.name,
            request.email,
            or_dash(&request.company),
            request.time_preference,
            or_dash(&request.message),
        ),
    }
}

pub fn call_confirmation(request: &ScheduleCallRequest) -> OutboundEmail {
    OutboundEmail {
        to: request.email.clone(),
        reply_to: None,
        subject: "We received your call request".to_string(),
        body: format!(
            "Hi {},\n\n\
             Thanks for your interest. We received your request for a call \
             and will confirm a slot shortly.\n\n\
             Your preferred time: {}\n\n\
             Kind regards,\nThe Investor Relations Team\n",
            request.name, request.time_preference,
        ),
    }
}

pub fn webinar_notification(to: &str, registration: &WebinarRegistration) -> OutboundEmail {
    let event = &registration.event_details;
    OutboundEmail {
        to: to.to_string(),
        reply_to: Some(registration.email.clone()),
        subject: format!("Webinar registration: {}", event.title),
        body: format!(
            "New webinar registration.\n\n\
             Name: {}\n\
             Email: {}\n\
             Company: {}\n\
             Event: {} on {} ({} - {})\n",
            registration.name,
            registration.email,
            or_dash(&registration.company),
            event.title,
            event.date,
            event.start_time,
            event.end_time,
        ),
    }
}

pub fn webinar_confirmation(registration: &WebinarRegistration) -> OutboundEmail {
    let event = &registration.event_details;
    OutboundEmail {
        to: registration.email.clone(),
        reply_to: None,
        subject: format!("You're registered: {}", event.title),
        body: format!(
            "Hi {},\n\n\
             You're registered for {}.\n\n\
             Date: {}\n\
             Time: {} - {}\n\n\
             We'll send joining details before the session.\n\n\
             Kind regards,\nThe Investor Relations Team\n",
            registration.name, event.title, event.date, event.start_time, event.end_time,
        ),
    }
}
