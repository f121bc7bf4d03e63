// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Investor site backend
//!
//! Serves the investor-relations front-end and its API: visitor activity
//! and funnel tracking, lead capture with transactional email, the deal
//! room document library, and office-to-PDF conversion. The `client`
//! module is the visitor-side half of activity tracking.

pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{DocumentConverter, LeadService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub leads: LeadService,
    pub converter: DocumentConverter,
}
