// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer (Firestore, with an in-memory stand-in).

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

/// Collection names as constants.
pub mod collections {
    /// Visitor activity and funnel progress (keyed by user_id)
    pub const USER_ACTIVITY: &str = "user_activity";
    /// Newsletter subscribers (keyed by encoded email)
    pub const NEWSLETTER_SUBSCRIBERS: &str = "newsletter_subscribers";
    pub const DEAL_ROOM_DOCUMENTS: &str = "deal_room_documents";
    /// Append-only deal room audit log
    pub const DEAL_ROOM_ACTIVITY: &str = "deal_room_activity";
}
