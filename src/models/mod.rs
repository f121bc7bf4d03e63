// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod activity;
pub mod deal_room;
pub mod lead;
pub mod newsletter;

pub use activity::{FunnelProgress, UserActivity, VisitEntry, ANONYMOUS_EMAIL};
pub use deal_room::{DealRoomAction, DealRoomActivity, DealRoomDocument, DocumentCategory, IconType};
pub use lead::{EventDetails, ScheduleCallRequest, WebinarRegistration};
pub use newsletter::NewsletterSubscriber;
