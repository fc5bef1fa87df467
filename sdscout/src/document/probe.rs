//! Content-type classification of candidate URLs.

use std::sync::Arc;
use std::time::Duration;

use crate::errors::TransportError;
use crate::websearch::{path_is_pdf, Fetcher};

/// How a candidate URL was classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The URL path ends in `.pdf`; no request was made.
    PathSuffix,
    /// A metadata request declared `application/pdf`.
    DeclaredPdf,
    /// A metadata request declared something else, or nothing.
    NotPdf(Option<String>),
    /// The metadata request timed out.
    Timeout,
    /// The metadata request failed below HTTP.
    Failed(String),
}

impl ProbeOutcome {
    /// Returns true if the candidate should be downloaded.
    #[must_use]
    pub fn looks_like_pdf(&self) -> bool {
        matches!(self, Self::PathSuffix | Self::DeclaredPdf)
    }
}

/// Decides whether a URL plausibly serves a PDF.
///
/// Fails closed: any doubt yields a negative outcome.
#[derive(Clone)]
pub struct ContentTypeProber {
    fetcher: Arc<dyn Fetcher>,
    timeout: Duration,
}

impl std::fmt::Debug for ContentTypeProber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentTypeProber")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ContentTypeProber {
    /// Creates a prober issuing metadata requests through `fetcher`.
    #[must_use]
    pub fn new(fetcher: Arc<dyn Fetcher>, timeout: Duration) -> Self {
        Self { fetcher, timeout }
    }

    /// Classifies `url`.
    pub async fn probe(&self, url: &str) -> ProbeOutcome {
        if path_is_pdf(url) {
            return ProbeOutcome::PathSuffix;
        }

        match self.fetcher.head(url, self.timeout).await {
            Ok(result) if result.is_pdf() => ProbeOutcome::DeclaredPdf,
            Ok(result) => ProbeOutcome::NotPdf(result.content_type),
            Err(TransportError::Timeout) => {
                tracing::warn!(url, "Content-type probe timed out");
                ProbeOutcome::Timeout
            }
            Err(err) => {
                tracing::warn!(url, error = %err, "Content-type probe failed");
                ProbeOutcome::Failed(err.to_string())
            }
        }
    }

    /// Shorthand for `probe(url).await.looks_like_pdf()`.
    pub async fn looks_like_pdf(&self, url: &str) -> bool {
        self.probe(url).await.looks_like_pdf()
    }
}
