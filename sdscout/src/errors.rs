//! Error types for the scout pipeline.
//!
//! Two layers exist. [`ScoutError`] is returned to callers and aborts an
//! invocation. The per-stage failure kinds ([`FetchFailure`],
//! [`ExtractFailure`]) never cross a candidate boundary: the orchestrator turns
//! them into a skipped candidate and moves on.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for scout operations.
#[derive(Debug, Error)]
pub enum ScoutError {
    /// An identifier failed validation.
    #[error("{0}")]
    InvalidIdentifier(#[from] InvalidIdentifierError),

    /// Configuration could not be loaded or is inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A storage directory could not be prepared.
    #[error("Storage error at {}: {source}", path.display())]
    Storage {
        /// The directory involved.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The search collaborator could not be reached or answered garbage.
    #[error("Search error: {0}")]
    Search(String),

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Client(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScoutError {
    /// Creates a storage error for the given directory.
    #[must_use]
    pub fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }
}

/// Error raised when a registry number does not have the `NNNNNNN-NN-N` shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid registry number '{value}': expected 2-7 digits, 2 digits and a check digit separated by hyphens")]
pub struct InvalidIdentifierError {
    /// The rejected input.
    pub value: String,
}

impl InvalidIdentifierError {
    /// Creates a new invalid identifier error.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

/// Error raised by the HTTP transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request exceeded its timeout.
    #[error("request timed out")]
    Timeout,

    /// The body exceeded the caller's size ceiling.
    #[error("response body exceeds {0} bytes")]
    TooLarge(usize),

    /// Connection, TLS, redirect or body errors.
    #[error("transport failure: {0}")]
    Other(String),
}

/// Why a document download did not produce a temporary file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    /// The GET request timed out.
    #[error("download timed out")]
    Timeout,

    /// The request failed below HTTP.
    #[error("download failed: {0}")]
    Transport(String),

    /// The server answered with a non-2xx status.
    #[error("unexpected status {0}")]
    Status(u16),

    /// The declared content type is not a PDF.
    #[error("not a PDF (content type {})", .0.as_deref().unwrap_or("<none>"))]
    NotPdf(Option<String>),

    /// The body exceeded the configured size ceiling.
    #[error("response exceeds the {0} byte size limit")]
    TooLarge(usize),

    /// The body could not be written to temporary storage.
    #[error("could not write temporary file: {0}")]
    Io(String),
}

impl From<TransportError> for FetchFailure {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout => Self::Timeout,
            TransportError::TooLarge(limit) => Self::TooLarge(limit),
            TransportError::Other(msg) => Self::Transport(msg),
        }
    }
}

impl FetchFailure {
    /// Short machine-readable kind, carried in `candidate.fetch_failed` events.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Transport(_) => "transport",
            Self::Status(_) => "status",
            Self::NotPdf(_) => "not_pdf",
            Self::TooLarge(_) => "too_large",
            Self::Io(_) => "io",
        }
    }
}

/// Why text could not be extracted from a downloaded document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractFailure {
    /// The file could not be read or parsed as a PDF.
    #[error("unreadable document: {0}")]
    Unreadable(String),

    /// The document parsed but page text could not be decoded.
    #[error("text decoding failed: {0}")]
    Decode(String),

    /// The document has no pages.
    #[error("document has no pages")]
    Empty,
}
