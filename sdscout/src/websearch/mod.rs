//! Search and HTTP access.
//!
//! This module provides:
//! - Protocol traits for the search collaborator and the HTTP layer
//! - A `reqwest`-backed fetcher
//! - Static and JSON-endpoint search providers
//! - Configuration for searching and fetching
//! - URL helpers for domains and local file names

mod client;
mod config;
mod protocols;
mod run_utils;
mod search;

pub use client::ReqwestFetcher;
pub use config::{FetchConfig, SearchConfig};
pub use protocols::{is_pdf_media_type, FetchResult, Fetcher, SearchProvider, PDF_MEDIA_TYPE};
pub use run_utils::{extract_domain, file_name_from_url, path_is_pdf, PDF_EXTENSION};
pub use search::{parse_search_response, EndpointSearchProvider, StaticSearchProvider};
