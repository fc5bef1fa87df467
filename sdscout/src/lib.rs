//! # sdscout
//!
//! Locates, downloads and verifies Safety Data Sheets for chemicals named by
//! CAS registry number or by substance name.
//!
//! For each request the scout issues a search query, walks the resulting
//! candidate URLs, drops known-bad sources, downloads plausible PDFs under
//! strict visit and download budgets, and keeps a file only if the text of
//! its first pages contains the phrase "safety data sheet" and every supplied
//! identifier.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sdscout::prelude::*;
//!
//! let scout = Scout::from_config(ScoutConfig::from_json_file("scout.json")?)?;
//! let outcome = scout
//!     .run(&[
//!         IdentifierRequest::for_cas("50-00-0"),
//!         IdentifierRequest::for_name("Acetone").with_urls(["https://example.com/sds.pdf"]),
//!     ])
//!     .await?;
//!
//! for entry in &outcome.report {
//!     println!("{} -> {}", entry.url, entry.filepath);
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod crawl;
pub mod document;
pub mod errors;
pub mod events;
pub mod identifier;
pub mod observability;
pub mod pipeline;
pub mod report;
pub mod testing;
pub mod websearch;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{
        BudgetConfig, ExplicitUrlPolicy, PolicyConfig, ScoutConfig, SelectionPolicy,
        StorageConfig, VisitScope,
    };
    pub use crate::crawl::{DownloadBudget, SkipList, VisitLedger};
    pub use crate::document::{LopdfExtractor, TextExtractor, Verification, Verifier};
    pub use crate::errors::{ExtractFailure, FetchFailure, ScoutError};
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::identifier::{Identifier, IdentifierRequest, RegistryNumber};
    pub use crate::pipeline::{CandidateOutcome, RunStats, Scout, ScoutOutcome};
    pub use crate::report::{Report, ReportEntry};
    pub use crate::websearch::{
        EndpointSearchProvider, FetchConfig, Fetcher, ReqwestFetcher, SearchConfig,
        SearchProvider, StaticSearchProvider,
    };
}

/// Version of the sdscout crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
