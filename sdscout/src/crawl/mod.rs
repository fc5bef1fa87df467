//! Pre-network screening of candidate URLs.
//!
//! Both checks here run before any request is made:
//! - [`SkipList`] rejects catalog, retail, social and navigation URLs
//! - [`VisitLedger`] and [`DownloadBudget`] bound how much a crawl may fetch

mod budget;
mod skiplist;

pub use budget::{Admission, DownloadBudget, VisitLedger};
pub use skiplist::{SkipList, DEFAULT_SKIP_TERMS};
