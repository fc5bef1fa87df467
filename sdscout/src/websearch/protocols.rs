//! Protocol traits for the network-facing collaborators.
//!
//! The pipeline talks to the network only through these traits, so the
//! search backend and the HTTP stack can be swapped without touching it.

use async_trait::async_trait;
use futures::stream::BoxStream;
use std::time::Duration;

use crate::errors::{ScoutError, TransportError};

/// Media type every accepted document must declare.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// Returns true if a Content-Type header names the PDF media type.
///
/// Parameters such as `; charset=binary` and letter case are ignored.
#[must_use]
pub fn is_pdf_media_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(str::trim)
        .is_some_and(|essence| essence.eq_ignore_ascii_case(PDF_MEDIA_TYPE))
}

/// Result of a fetch operation.
#[derive(Debug, Clone, Default)]
pub struct FetchResult {
    /// HTTP status code.
    pub status_code: u16,
    /// Content type from headers.
    pub content_type: Option<String>,
    /// Response body. Empty for metadata-only requests.
    pub body: Vec<u8>,
    /// Final URL after redirects.
    pub final_url: String,
    /// Time taken to fetch in milliseconds.
    pub duration_ms: f64,
}

impl FetchResult {
    /// Whether the declared content type is PDF.
    #[must_use]
    pub fn is_pdf(&self) -> bool {
        self.content_type.as_deref().is_some_and(is_pdf_media_type)
    }

    /// Whether the fetch was successful (2xx status).
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// Protocol for HTTP access.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Issues a metadata-only request.
    async fn head(&self, url: &str, timeout: Duration) -> Result<FetchResult, TransportError>;

    /// Downloads a URL, failing with [`TransportError::TooLarge`] past `max_bytes`.
    async fn get(
        &self,
        url: &str,
        timeout: Duration,
        max_bytes: usize,
    ) -> Result<FetchResult, TransportError>;
}

/// Protocol for the search collaborator.
///
/// The returned stream is lazy, finite and ordered; earlier results are
/// tried first and the pipeline may drop it before it is drained.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Runs `query`, asking for at most `count` result URLs.
    async fn search(
        &self,
        query: &str,
        count: usize,
    ) -> Result<BoxStream<'static, String>, ScoutError>;
}
