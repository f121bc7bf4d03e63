// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Secrets (JWT key, admin credential, SMTP password) are read once at
//! startup and kept in memory; nothing here is ever sent to the browser.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Which document store backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Google Cloud Firestore (or the emulator when `FIRESTORE_EMULATOR_HOST` is set)
    Firestore,
    /// Process-local store, lost on restart. Local development and tests.
    Memory,
}

/// SMTP transport settings. Absent when `SMTP_HOST` is not set.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend origin allowed by CORS
    pub frontend_url: String,
    /// Public base URL of this API (used by the sync client)
    pub api_base_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Document store backend
    pub store_backend: StoreBackend,
    /// Internal recipient of lead notifications
    pub notification_email: String,
    /// Sender address for all outbound mail
    pub mail_from: String,
    /// Directory holding the built front-end
    pub static_dir: PathBuf,
    /// Where converted PDFs are written
    pub conversion_output_dir: PathBuf,
    /// LibreOffice binary used for document conversion
    pub soffice_bin: String,
    /// Upper bound for email sends, HTTP fetches and conversions
    pub outbound_timeout: Duration,

    // --- Secrets ---
    /// JWT signing key for admin sessions (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Admin username
    pub admin_username: String,
    /// Admin password
    pub admin_password: String,
    /// SMTP transport, if configured
    pub smtp: Option<SmtpConfig>,
}

const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_OUTBOUND_TIMEOUT_SECS: u64 = 30;

impl Config {
    /// Config for tests only.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            api_base_url: "http://localhost:8080".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            store_backend: StoreBackend::Memory,
            notification_email: "team@example.com".to_string(),
            mail_from: "noreply@example.com".to_string(),
            static_dir: PathBuf::from("web/dist"),
            conversion_output_dir: env::temp_dir().join("investor-site-converted"),
            soffice_bin: "soffice".to_string(),
            outbound_timeout: Duration::from_secs(5),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            admin_username: "admin".to_string(),
            admin_password: "correct horse battery staple".to_string(),
            smtp: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is honoured for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let store_backend = match env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "firestore".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "firestore" => StoreBackend::Firestore,
            "memory" => StoreBackend::Memory,
            other => return Err(ConfigError::Invalid("STORE_BACKEND", other.to_string())),
        };

        let smtp = env::var("SMTP_HOST").ok().map(|host| SmtpConfig {
            host,
            port: env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            username: env::var("SMTP_USER").ok(),
            password: env::var("SMTP_PASSWORD").map(|v| v.trim().to_string()).ok(),
        });

        let outbound_timeout_secs = env::var("OUTBOUND_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_OUTBOUND_TIMEOUT_SECS);

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            api_base_url: env::var("API_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            store_backend,
            notification_email: env::var("NOTIFICATION_EMAIL")
                .unwrap_or_else(|_| "investors@localhost".to_string()),
            mail_from: env::var("SMTP_FROM").unwrap_or_else(|_| "noreply@localhost".to_string()),
            static_dir: env::var("STATIC_DIR")
                .unwrap_or_else(|_| "web/dist".to_string())
                .into(),
            conversion_output_dir: env::var("CONVERSION_OUTPUT_DIR")
                .unwrap_or_else(|_| "converted".to_string())
                .into(),
            soffice_bin: env::var("SOFFICE_BIN").unwrap_or_else(|_| "soffice".to_string()),
            outbound_timeout: Duration::from_secs(outbound_timeout_secs),

            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            admin_username: env::var("ADMIN_USERNAME")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("ADMIN_USERNAME"))?,
            admin_password: env::var("ADMIN_PASSWORD")
                .map_err(|_| ConfigError::Missing("ADMIN_PASSWORD"))?,
            smtp,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
