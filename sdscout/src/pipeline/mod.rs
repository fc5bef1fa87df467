//! Pipeline orchestration.
//!
//! [`Scout`] drives each request through query, candidate stream, skip-list,
//! visit ledger, probe, download, extraction and verification, then promotes
//! or deletes the download. Stage failures become a [`CandidateOutcome`] and
//! the crawl continues; only download-budget exhaustion ends it early.

mod integration_tests;
mod outcome;
mod scout;

pub use outcome::{CandidateOutcome, RunStats, ScoutOutcome};
pub use scout::Scout;
