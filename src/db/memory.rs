// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Process-local document store used for local development and tests.
//!
//! Mirrors the Firestore collections one map per collection. Data is lost
//! when the process exits.

use crate::models::newsletter::subscriber_doc_id;
use crate::models::{
    DealRoomActivity, DealRoomDocument, FunnelProgress, NewsletterSubscriber, UserActivity,
};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

#[derive(Default)]
pub struct MemoryStore {
    user_activity: DashMap<String, UserActivity>,
    subscribers: DashMap<String, NewsletterSubscriber>,
    deal_room_documents: DashMap<String, DealRoomDocument>,
    deal_room_activity: DashMap<String, DealRoomActivity>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_user_activity(&self, user_id: &str) -> Option<UserActivity> {
        self.user_activity.get(user_id).map(|r| r.value().clone())
    }

    pub fn record_visit(&self, user_id: &str, email: &str, page: &str, now: &str) -> UserActivity {
        let mut record = self
            .user_activity
            .entry(user_id.to_string())
            .or_insert_with(|| UserActivity::new(user_id, email, now));
        record.record_visit(email, page, now);
        record.value().clone()
    }

    pub fn merge_progress(&self, user_id: &str, update: &FunnelProgress) -> Option<FunnelProgress> {
        let mut record = self.user_activity.get_mut(user_id)?;
        record.progress.merge(update);
        Some(record.progress.clone())
    }

    pub fn insert_subscriber(&self, subscriber: &NewsletterSubscriber) -> bool {
        match self.subscribers.entry(subscriber_doc_id(&subscriber.email)) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(subscriber.clone());
                true
            }
        }
    }

    pub fn list_subscribers(&self) -> Vec<NewsletterSubscriber> {
        let mut subscribers: Vec<NewsletterSubscriber> =
            self.subscribers.iter().map(|r| r.value().clone()).collect();
        subscribers.sort_by(|a, b| a.subscribed_at.cmp(&b.subscribed_at));
        subscribers
    }

    pub fn list_deal_room_documents(&self) -> Vec<DealRoomDocument> {
        self.deal_room_documents
            .iter()
            .map(|r| r.value().clone())
            .collect()
    }

    pub fn get_deal_room_document(&self, id: &str) -> Option<DealRoomDocument> {
        self.deal_room_documents.get(id).map(|r| r.value().clone())
    }

    pub fn upsert_deal_room_document(&self, document: &DealRoomDocument) {
        self.deal_room_documents
            .insert(document.id.clone(), document.clone());
    }

    pub fn append_deal_room_activity(&self, event: &DealRoomActivity) {
        // Event IDs are fresh UUIDs; an existing key is never overwritten.
        self.deal_room_activity
            .entry(event.id.clone())
            .or_insert_with(|| event.clone());
    }

    pub fn list_deal_room_activity(&self, limit: usize) -> Vec<DealRoomActivity> {
        let mut events: Vec<DealRoomActivity> = self
            .deal_room_activity
            .iter()
            .map(|r| r.value().clone())
            .collect();
        events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        events.truncate(limit);
        events
    }
}
