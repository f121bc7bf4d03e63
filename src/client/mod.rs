// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity sync client: local visitor state plus best-effort replication
//! to the tracking API.

pub mod storage;
pub mod tracker;

pub use storage::{JsonFileStorage, KeyValueStore, LocalState, MemoryStorage, PageEvent, StorageError};
pub use tracker::{ActivityTracker, SyncHandle, SyncOutcome, SyncReport};
