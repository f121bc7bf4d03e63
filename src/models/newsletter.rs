// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Newsletter subscriber model.

use serde::{Deserialize, Serialize};

/// Newsletter subscriber stored in Firestore, keyed by normalised email.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewsletterSubscriber {
    /// Lowercased, trimmed email (unique)
    pub email: String,
    /// When the subscription was created (RFC 3339)
    pub subscribed_at: String,
}

/// Canonical form used for the uniqueness check.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Firestore document ID for a normalised email.
pub fn subscriber_doc_id(normalized_email: &str) -> String {
    urlencoding::encode(normalized_email).into_owned()
}
