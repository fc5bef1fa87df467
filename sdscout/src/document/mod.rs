//! Document stages: probe, fetch, extract, verify, and the storage they share.
//!
//! Each stage returns a typed result. None of them decide what happens to a
//! candidate; the orchestrator in [`crate::pipeline`] does.

mod extract;
mod fetch;
mod probe;
mod storage;
mod verify;

pub use extract::{LopdfExtractor, TextExtractor};
pub use fetch::{DocumentFetcher, DownloadedDocument};
pub use probe::{ContentTypeProber, ProbeOutcome};
pub use storage::{RunDir, Storage};
pub use verify::{Verification, Verifier};
