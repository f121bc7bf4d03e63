// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Investor site API server
//!
//! Serves the front-end, tracking and lead-capture APIs, the deal room,
//! and admin utilities.

use investor_site::{
    config::{Config, StoreBackend},
    db::FirestoreDb,
    services::{DocumentConverter, LeadService, Mailer, SofficeEngine},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting investor site API");

    // Initialize the document store
    let db = match config.store_backend {
        StoreBackend::Firestore => FirestoreDb::new(&config.gcp_project_id).await?,
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store, data will not survive a restart");
            FirestoreDb::new_in_memory()
        }
    };

    // Outbound email
    let mailer = Mailer::from_config(&config)?;
    let leads = LeadService::new(mailer, config.notification_email.clone());

    // Document conversion
    let converter = DocumentConverter::new(
        Arc::new(SofficeEngine::new(config.soffice_bin.clone())),
        config.outbound_timeout,
    );
    tracing::info!(
        output_dir = %config.conversion_output_dir.display(),
        "Document converter initialized"
    );

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        leads,
        converter,
    });

    // Build router
    let app = investor_site::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("investor_site=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
