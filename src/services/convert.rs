// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Office document to PDF conversion.
//!
//! Sources are either a local file or a URL (fetched and fully buffered).
//! The actual conversion is delegated to a [`ConversionEngine`]; the default
//! engine shells out to LibreOffice in headless mode. Results are written to
//! the output directory as `{source-stem}-{uuid}.pdf`, so concurrent
//! conversions of the same source never collide.
//!
//! One attempt per call, no retry. Fetches and engine runs are bounded by
//! the configured timeout.

use futures_util::future::BoxFuture;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Extension assumed when the source name doesn't carry one.
const DEFAULT_SOURCE_EXTENSION: &str = "docx";

/// Error type for document conversion.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to fetch source document: {0}")]
    Fetch(String),

    #[error("conversion engine binary not found: {0}")]
    EngineNotFound(std::io::Error),

    #[error("conversion engine failed (exit code {exit_code:?}): {stderr}")]
    Engine {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("conversion engine produced no output")]
    MissingOutput,

    #[error("conversion timed out after {0:?}")]
    Timeout(Duration),
}

/// Turns office document bytes into PDF bytes.
pub trait ConversionEngine: Send + Sync {
    /// `extension` is the source's file extension without the dot (e.g. `docx`).
    fn convert<'a>(
        &'a self,
        source: &'a [u8],
        extension: &'a str,
    ) -> BoxFuture<'a, Result<Vec<u8>, ConversionError>>;
}

// ─── LibreOffice ───────────────────────────────────────────────

/// Runs `soffice --headless --convert-to pdf` in a scratch directory.
pub struct SofficeEngine {
    binary: String,
}

impl SofficeEngine {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    async fn run(&self, source: &[u8], extension: &str) -> Result<Vec<u8>, ConversionError> {
        // Removed on drop, including after a failed or timed out run.
        let scratch = tempfile::tempdir()?;
        let input = scratch.path().join(format!("source.{extension}"));
        tokio::fs::write(&input, source).await?;

        let output = tokio::process::Command::new(&self.binary)
            .args(["--headless", "--convert-to", "pdf", "--outdir"])
            .arg(scratch.path())
            .arg(&input)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(ConversionError::EngineNotFound)?;

        if !output.status.success() {
            return Err(ConversionError::Engine {
                exit_code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        match tokio::fs::read(scratch.path().join("source.pdf")).await {
            Ok(pdf) => Ok(pdf),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ConversionError::MissingOutput)
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl ConversionEngine for SofficeEngine {
    fn convert<'a>(
        &'a self,
        source: &'a [u8],
        extension: &'a str,
    ) -> BoxFuture<'a, Result<Vec<u8>, ConversionError>> {
        Box::pin(self.run(source, extension))
    }
}

// ─── Converter ─────────────────────────────────────────────────

#[derive(Clone)]
pub struct DocumentConverter {
    engine: Arc<dyn ConversionEngine>,
    http: reqwest::Client,
    timeout: Duration,
}

impl DocumentConverter {
    pub fn new(engine: Arc<dyn ConversionEngine>, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client for conversions");
                reqwest::Client::new()
            });

        Self {
            engine,
            http,
            timeout,
        }
    }

    /// Convert a local office document; returns the path of the written PDF.
    pub async fn convert_document_to_pdf(
        &self,
        input_path: &Path,
        output_dir: &Path,
    ) -> Result<PathBuf, ConversionError> {
        tokio::fs::create_dir_all(output_dir).await?;

        let source = tokio::fs::read(input_path).await?;
        let name = input_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        self.convert_bytes(&source, &name, output_dir).await
    }

    /// Fetch an office document over HTTP and convert it.
    pub async fn convert_url_document_to_pdf(
        &self,
        url: &str,
        output_dir: &Path,
    ) -> Result<PathBuf, ConversionError> {
        tokio::fs::create_dir_all(output_dir).await?;

        let parsed = reqwest::Url::parse(url).map_err(|e| ConversionError::Fetch(e.to_string()))?;
        let name = parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .map(|s| {
                urlencoding::decode(s)
                    .map(|d| d.into_owned())
                    .unwrap_or_else(|_| s.to_string())
            })
            .unwrap_or_default();

        tracing::debug!(url = %parsed, "Fetching document for conversion");

        let response = self
            .http
            .get(parsed)
            .send()
            .await
            .map_err(|e| ConversionError::Fetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ConversionError::Fetch(format!(
                "source responded with {}",
                response.status()
            )));
        }

        let source = response
            .bytes()
            .await
            .map_err(|e| ConversionError::Fetch(e.to_string()))?;

        self.convert_bytes(&source, &name, output_dir).await
    }

    async fn convert_bytes(
        &self,
        source: &[u8],
        source_name: &str,
        output_dir: &Path,
    ) -> Result<PathBuf, ConversionError> {
        let (stem, extension) = split_source_name(source_name);

        let pdf = tokio::time::timeout(self.timeout, self.engine.convert(source, &extension))
            .await
            .map_err(|_| ConversionError::Timeout(self.timeout))??;

        let output_path = output_dir.join(unique_pdf_name(&stem));
        tokio::fs::write(&output_path, pdf).await?;

        tracing::info!(
            source = source_name,
            output = %output_path.display(),
            "Document converted to PDF"
        );

        Ok(output_path)
    }
}

/// Split a file name into a filesystem-safe stem and a lowercase extension.
fn split_source_name(name: &str) -> (String, String) {
    let path = Path::new(name);

    let stem: String = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let stem = if stem.trim_matches('_').is_empty() {
        "document".to_string()
    } else {
        stem
    };

    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| DEFAULT_SOURCE_EXTENSION.to_string());

    (stem, extension)
}

fn unique_pdf_name(stem: &str) -> String {
    format!("{}-{}.pdf", stem, uuid::Uuid::new_v4().simple())
}
