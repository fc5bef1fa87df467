//! Mock collaborators for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::document::TextExtractor;
use crate::errors::{ExtractFailure, TransportError};
use crate::websearch::{FetchResult, Fetcher, PDF_MEDIA_TYPE};

#[derive(Debug, Clone)]
enum Scripted {
    Reply {
        status: u16,
        content_type: Option<String>,
        body: Vec<u8>,
    },
    Timeout,
    Fail(String),
}

/// A fetcher serving scripted responses and recording every request.
///
/// URLs without a script fail with a transport error.
#[derive(Debug, Default)]
pub struct MockFetcher {
    scripts: HashMap<String, Scripted>,
    head_calls: Mutex<Vec<String>>,
    get_calls: Mutex<Vec<String>>,
}

impl MockFetcher {
    /// Creates a fetcher with no scripts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts a full response. HEAD requests get the same status and type, no body.
    #[must_use]
    pub fn with_response(
        mut self,
        url: impl Into<String>,
        status: u16,
        content_type: Option<&str>,
        body: Vec<u8>,
    ) -> Self {
        self.scripts.insert(
            url.into(),
            Scripted::Reply {
                status,
                content_type: content_type.map(str::to_string),
                body,
            },
        );
        self
    }

    /// Scripts a 200 `application/pdf` response.
    #[must_use]
    pub fn with_pdf(self, url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.with_response(url, 200, Some(PDF_MEDIA_TYPE), body.into())
    }

    /// Scripts a 200 response with an empty body and the given type.
    #[must_use]
    pub fn with_content_type(self, url: impl Into<String>, content_type: &str) -> Self {
        self.with_response(url, 200, Some(content_type), Vec::new())
    }

    /// Scripts a bare status.
    #[must_use]
    pub fn with_status(self, url: impl Into<String>, status: u16) -> Self {
        self.with_response(url, status, None, Vec::new())
    }

    /// Scripts a timeout.
    #[must_use]
    pub fn with_timeout(mut self, url: impl Into<String>) -> Self {
        self.scripts.insert(url.into(), Scripted::Timeout);
        self
    }

    /// Scripts a transport failure.
    #[must_use]
    pub fn with_failure(mut self, url: impl Into<String>, message: impl Into<String>) -> Self {
        self.scripts.insert(url.into(), Scripted::Fail(message.into()));
        self
    }

    /// URLs that received a HEAD request, in order.
    #[must_use]
    pub fn head_calls(&self) -> Vec<String> {
        self.head_calls.lock().clone()
    }

    /// URLs that received a GET request, in order.
    #[must_use]
    pub fn get_calls(&self) -> Vec<String> {
        self.get_calls.lock().clone()
    }

    /// Number of requests of either kind made to `url`.
    #[must_use]
    pub fn calls_to(&self, url: &str) -> usize {
        let heads = self.head_calls.lock().iter().filter(|u| *u == url).count();
        let gets = self.get_calls.lock().iter().filter(|u| *u == url).count();
        heads + gets
    }

    fn respond(&self, url: &str, with_body: bool) -> Result<FetchResult, TransportError> {
        match self.scripts.get(url) {
            Some(Scripted::Reply {
                status,
                content_type,
                body,
            }) => Ok(FetchResult {
                status_code: *status,
                content_type: content_type.clone(),
                body: if with_body { body.clone() } else { Vec::new() },
                final_url: url.to_string(),
                duration_ms: 0.0,
            }),
            Some(Scripted::Timeout) => Err(TransportError::Timeout),
            Some(Scripted::Fail(message)) => Err(TransportError::Other(message.clone())),
            None => Err(TransportError::Other(format!("no route to {url}"))),
        }
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn head(&self, url: &str, _timeout: Duration) -> Result<FetchResult, TransportError> {
        self.head_calls.lock().push(url.to_string());
        self.respond(url, false)
    }

    async fn get(
        &self,
        url: &str,
        _timeout: Duration,
        max_bytes: usize,
    ) -> Result<FetchResult, TransportError> {
        self.get_calls.lock().push(url.to_string());
        let result = self.respond(url, true)?;
        if result.body.len() > max_bytes {
            return Err(TransportError::TooLarge(max_bytes));
        }
        Ok(result)
    }
}

/// An extractor that returns the file's bytes as text.
///
/// Lets tests script document text through the fetcher's response bodies.
#[derive(Debug, Default)]
pub struct StubExtractor {
    failing: bool,
    calls: Mutex<Vec<PathBuf>>,
}

impl StubExtractor {
    /// Creates an extractor that reads files verbatim.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an extractor that rejects every document.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Paths handed to the extractor, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<PathBuf> {
        self.calls.lock().clone()
    }
}

impl TextExtractor for StubExtractor {
    fn extract_text(&self, path: &Path) -> Result<String, ExtractFailure> {
        self.calls.lock().push(path.to_path_buf());
        if self.failing {
            return Err(ExtractFailure::Unreadable("stub rejects every document".into()));
        }
        let bytes = std::fs::read(path).map_err(|e| ExtractFailure::Unreadable(e.to_string()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
