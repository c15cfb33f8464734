//! Document acquisition: resume reference to raw text.
//!
//! References are `http(s)://` URLs or local paths (optionally `file://`).
//! PDFs are detected by their `%PDF` magic bytes and converted on the
//! blocking pool; anything else must be UTF-8 text.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::Member;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);
const PDF_MAGIC: &[u8] = b"%PDF";

#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed with status {0}")]
    Status(u16),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF text extraction failed: {0}")]
    Pdf(String),

    #[error("Document is neither PDF nor UTF-8 text")]
    Encoding,

    #[error("Extraction task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn fetch(&self, reference: &str) -> Result<String, AcquireError>;
}

/// Default source: downloads URLs with reqwest, reads everything else from disk.
#[derive(Debug, Clone)]
pub struct ResumeFetcher {
    client: Client,
}

impl ResumeFetcher {
    pub fn new() -> Result<Self, AcquireError> {
        let client = Client::builder().timeout(DOWNLOAD_TIMEOUT).build()?;
        Ok(Self { client })
    }

    async fn read_bytes(&self, reference: &str) -> Result<Bytes, AcquireError> {
        let reference = reference.trim();
        if reference.starts_with("http://") || reference.starts_with("https://") {
            let response = self.client.get(reference).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(AcquireError::Status(status.as_u16()));
            }
            return Ok(response.bytes().await?);
        }

        let path = reference.strip_prefix("file://").unwrap_or(reference);
        Ok(Bytes::from(tokio::fs::read(Path::new(path)).await?))
    }
}

#[async_trait]
impl DocumentSource for ResumeFetcher {
    async fn fetch(&self, reference: &str) -> Result<String, AcquireError> {
        let bytes = self.read_bytes(reference).await?;
        debug!(reference, size = bytes.len(), "Fetched document");
        bytes_to_text(bytes).await
    }
}

/// PDF (by magic bytes) through `pdf-extract`, otherwise strict UTF-8.
pub async fn bytes_to_text(bytes: Bytes) -> Result<String, AcquireError> {
    if bytes.starts_with(PDF_MAGIC) {
        // CPU-bound parse, kept off the async workers.
        return tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem(&bytes).map_err(|e| AcquireError::Pdf(e.to_string()))
        })
        .await?;
    }
    String::from_utf8(bytes.to_vec()).map_err(|_| AcquireError::Encoding)
}

/// Fetches a member's resume. Any failure is logged against the member and
/// yields empty text, so the member is still scored (category-only).
pub async fn fetch_or_empty(source: &dyn DocumentSource, member: &Member) -> String {
    match source.fetch(&member.resume_reference).await {
        Ok(text) => text,
        Err(e) => {
            warn!(member_id = %member.id, "Resume unavailable, using empty text: {e}");
            String::new()
        }
    }
}
