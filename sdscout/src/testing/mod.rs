//! Testing utilities for scout pipelines.
//!
//! This module provides:
//! - An in-memory [`Fetcher`](crate::websearch::Fetcher) with scripted responses
//! - A text extractor that reads files verbatim
//! - Generated PDF fixtures

mod fixtures;
mod mocks;

pub use fixtures::sample_pdf;
pub use mocks::{MockFetcher, StubExtractor};
