// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client-side persistent key-value storage.
//!
//! [`KeyValueStore`] is the raw string store (the browser's local storage
//! in the original deployment). [`LocalState`] layers typed accessors for
//! the handful of keys the tracker uses on top of it, so nothing else reads
//! or writes raw keys.

use crate::models::activity::{is_identified, ANONYMOUS_EMAIL};
use crate::models::FunnelProgress;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Maximum entries kept per local event list; older entries are rotated out.
pub const MAX_LOCAL_EVENTS: usize = 500;

/// Storage keys.
pub mod keys {
    pub const USER_ID: &str = "userId";
    pub const USER_EMAIL: &str = "userEmail";
    pub const PROGRESS: &str = "progress";
    pub const PAGE_VIEWS: &str = "pageViews";
    pub const PAGE_DURATIONS: &str = "pageDurations";
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage lock poisoned")]
    Poisoned,
}

/// A string-to-string persistent store.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

// ─── In-memory ─────────────────────────────────────────────────

/// Store that lives as long as the value does.
#[derive(Default)]
pub struct MemoryStorage {
    entries: DashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

// ─── JSON file ─────────────────────────────────────────────────

/// Store persisted as a single JSON object on disk.
///
/// The whole file is rewritten on every change (write to a sibling temp
/// file, then rename).
pub struct JsonFileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStorage {
    /// Open the store at `path`, starting empty if the file doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, serde_json::to_vec(entries)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }
}

// ─── Typed view ────────────────────────────────────────────────

/// A locally recorded page view or page duration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageEvent {
    pub user_id: String,
    pub email: String,
    pub page: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
}

/// Typed accessors over a [`KeyValueStore`].
#[derive(Clone)]
pub struct LocalState {
    store: Arc<dyn KeyValueStore>,
}

impl LocalState {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn user_id(&self) -> Result<Option<String>, StorageError> {
        Ok(self.store.get(keys::USER_ID)?.filter(|id| !id.trim().is_empty()))
    }

    pub fn set_user_id(&self, user_id: &str) -> Result<(), StorageError> {
        self.store.set(keys::USER_ID, user_id)
    }

    /// Last known email, or the anonymous sentinel.
    pub fn email(&self) -> Result<String, StorageError> {
        Ok(self
            .store
            .get(keys::USER_EMAIL)?
            .filter(|e| is_identified(e))
            .unwrap_or_else(|| ANONYMOUS_EMAIL.to_string()))
    }

    pub fn set_email(&self, email: &str) -> Result<(), StorageError> {
        self.store.set(keys::USER_EMAIL, email.trim())
    }

    /// Cached progress snapshot. An unreadable snapshot reads as empty.
    pub fn progress(&self) -> Result<FunnelProgress, StorageError> {
        let Some(raw) = self.store.get(keys::PROGRESS)? else {
            return Ok(FunnelProgress::default());
        };
        Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Discarding unreadable cached progress");
            FunnelProgress::default()
        }))
    }

    pub fn set_progress(&self, progress: &FunnelProgress) -> Result<(), StorageError> {
        self.store
            .set(keys::PROGRESS, &serde_json::to_string(progress)?)
    }

    pub fn page_views(&self) -> Result<Vec<PageEvent>, StorageError> {
        self.events(keys::PAGE_VIEWS)
    }

    pub fn push_page_view(&self, event: PageEvent) -> Result<(), StorageError> {
        self.push_event(keys::PAGE_VIEWS, event)
    }

    pub fn page_durations(&self) -> Result<Vec<PageEvent>, StorageError> {
        self.events(keys::PAGE_DURATIONS)
    }

    pub fn push_page_duration(&self, event: PageEvent) -> Result<(), StorageError> {
        self.push_event(keys::PAGE_DURATIONS, event)
    }

    fn events(&self, key: &str) -> Result<Vec<PageEvent>, StorageError> {
        match self.store.get(key)? {
            Some(raw) => Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(key, error = %e, "Discarding unreadable event list");
                Vec::new()
            })),
            None => Ok(Vec::new()),
        }
    }

    fn push_event(&self, key: &str, event: PageEvent) -> Result<(), StorageError> {
        let mut events = self.events(key)?;
        events.push(event);
        if events.len() > MAX_LOCAL_EVENTS {
            let excess = events.len() - MAX_LOCAL_EVENTS;
            events.drain(..excess);
        }
        self.store.set(key, &serde_json::to_string(&events)?)
    }
}
